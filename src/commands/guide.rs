use log::info;
use poll_guide_bot::db::{Database, OptionStore, PollStore, ResponseStore};
use poll_guide_bot::guide::{CancelReason, GuideError, request_key};
use poll_guide_bot::models::GuideRecord;
use poll_guide_bot::{GuideGenerator, voting};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::application::interaction::application_command::{ApplicationCommandInteraction, CommandDataOption};
use serenity::prelude::*;

// Discord rejects message content longer than this
const MESSAGE_LIMIT: usize = 2000;

pub fn create_guide_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("guide")
        .description("AI-written guides for finished polls")
        .create_option(|option| {
            option
                .name("generate")
                .description("Close a poll and write a guide from its results")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("poll_id")
                        .description("ID of the poll")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("style")
                        .description("How the guide should be written, e.g. \"a short checklist\"")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("cancel")
                .description("Stop a guide that is still being written")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("poll_id")
                        .description("ID of the poll")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("style")
                        .description("Style the guide was requested with")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("results")
                .description("Show a poll's current percentages")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("poll_id")
                        .description("ID of the poll")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
}

pub async fn handle_guide_command(
    database: &Database,
    generator: &GuideGenerator,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(subcommand) = command.data.options.first() else {
        send_ephemeral(ctx, command, "No subcommand provided").await?;
        return Ok(());
    };

    let Some(poll_id) = string_option(subcommand, "poll_id") else {
        send_ephemeral(ctx, command, "A poll ID is required").await?;
        return Ok(());
    };

    match subcommand.name.as_str() {
        "generate" => {
            let style = string_option(subcommand, "style").unwrap_or("guide");
            handle_generate(generator, ctx, command, poll_id, style).await?
        }
        "cancel" => {
            let style = string_option(subcommand, "style").unwrap_or("guide");
            handle_cancel(generator, ctx, command, poll_id, style).await?
        }
        "results" => handle_results(database, ctx, command, poll_id).await?,
        _ => send_ephemeral(ctx, command, "Unknown subcommand").await?,
    }

    Ok(())
}

async fn handle_generate(
    generator: &GuideGenerator,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
    style: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Generation takes far longer than the 3s Discord allows for a first reply
    command
        .create_interaction_response(&ctx.http, |response| {
            response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
        })
        .await?;

    info!("User {} requested a '{}' guide for poll {}", command.user.id, style, poll_id);
    let reply = match generator.generate_guide(poll_id, style).await {
        Ok(guide) => format_guide(&guide),
        Err(e) => describe_error(&e),
    };

    command
        .edit_original_interaction_response(&ctx.http, |response| response.content(truncate(&reply, MESSAGE_LIMIT)))
        .await?;
    Ok(())
}

async fn handle_cancel(
    generator: &GuideGenerator,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
    style: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cancelled = generator.tracker().mark_externally_cancelled(&request_key(poll_id, style));
    let message = if cancelled {
        "Guide generation will stop at its next step."
    } else {
        "No guide is being written for that poll and style."
    };
    send_ephemeral(ctx, command, message).await?;
    Ok(())
}

async fn handle_results(
    database: &Database,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    poll_id: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(poll) = database.find_by_id(poll_id).await? else {
        send_ephemeral(ctx, command, "Poll not found.").await?;
        return Ok(());
    };

    let options = database.find_options(poll_id).await?;
    let responses = database.find_responses(poll_id).await?;
    let tallies = voting::aggregate(&options, &responses);

    let mut summary = format!("**{}**\n", poll.question);
    for tally in &tallies {
        summary.push_str(&format!(
            "{}: {} vote(s) ({:.1}%)\n",
            tally.content, tally.response_count, tally.percentage
        ));
    }
    summary.push_str(&format!("\n{} response(s) in total.", responses.len()));

    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(truncate(&summary, MESSAGE_LIMIT)))
        })
        .await?;
    Ok(())
}

fn string_option<'a>(subcommand: &'a CommandDataOption, name: &str) -> Option<&'a str> {
    subcommand
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
}

fn format_guide(guide: &GuideRecord) -> String {
    format!("**{}**\n\n{}", guide.title, guide.content)
}

fn describe_error(err: &GuideError) -> String {
    match err {
        GuideError::NotFound(what) => format!("Could not write a guide: {} not found.", what),
        GuideError::Cancelled(CancelReason::ShuttingDown) => "The bot is restarting, please try again shortly.".to_string(),
        GuideError::Cancelled(_) => "This guide request was cancelled or replaced by a newer one.".to_string(),
        GuideError::MalformedResponse { .. } => "The AI answered in an unexpected format. Please try again.".to_string(),
        GuideError::Failed(_) => "Guide generation failed. Please try again later.".to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}

async fn send_ephemeral(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    message: &str,
) -> Result<(), serenity::Error> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|data| data.content(message).ephemeral(true))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_character_limit() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate(&"가".repeat(30), 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn error_messages_do_not_leak_details() {
        let err = GuideError::Failed("connection refused to 10.0.0.3".into());
        assert!(!describe_error(&err).contains("10.0.0.3"));
        assert!(describe_error(&GuideError::NotFound("poll p1".into())).contains("poll p1"));
    }
}
