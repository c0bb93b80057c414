mod commands;
mod handlers;

use log::{error, info};
use poll_guide_bot::config::Config;
use poll_guide_bot::db::{Database, Storage};
use poll_guide_bot::gateway::{ChatCompletionGateway, GoogleTranslateGateway};
use poll_guide_bot::guide::{GuideGenerator, RequestTracker, TranslationPipeline};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

struct Bot {
    database: Arc<Database>,
    generator: Arc<GuideGenerator>,
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let db = Arc::clone(&self.database);
        let generator = Arc::clone(&self.generator);

        // Guide runs take a while; never block the gateway event loop
        tokio::spawn(async move {
            handlers::handle_interaction(&db, &generator, &ctx, interaction).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        match commands::register_commands(&ctx).await {
            Ok(_) => info!("Successfully registered global slash commands."),
            Err(why) => error!("Failed to register slash commands: {:?}", why),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let database = match Database::new(&config.database_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let model = match ChatCompletionGateway::new(
        &config.llm_endpoint,
        &config.llm_api_key,
        &config.llm_model,
        config.llm_timeout,
    ) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            error!("Failed to build language model client: {}", e);
            return;
        }
    };

    let translator = TranslationPipeline::new(
        Arc::new(GoogleTranslateGateway::new(&config.translate_endpoint, &config.translate_api_key)),
        &config.source_lang,
        &config.pivot_lang,
    );

    let tracker = Arc::new(RequestTracker::new());
    let storage: Arc<dyn Storage> = database.clone();
    let generator = Arc::new(GuideGenerator::new(storage, translator, model, Arc::clone(&tracker)));

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_INTEGRATIONS;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Bot { database, generator })
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Err creating client: {:?}", e);
            return;
        }
    };

    // Stop in-flight guide runs at their next checkpoint, then disconnect
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown requested");
        tracker.shutdown();
        shard_manager.lock().await.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
