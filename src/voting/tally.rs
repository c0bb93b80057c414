use crate::models::{PollOption, PollResponse};
use crate::voting::OptionTally;
use std::collections::HashMap;

/// Counts responses per option and converts them to percentages of all
/// responses. Output follows the order of `options`.
pub fn aggregate(options: &[PollOption], responses: &[PollResponse]) -> Vec<OptionTally> {
    // Count responses per option id
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for response in responses {
        *counts.entry(response.option_id.as_str()).or_insert(0) += 1;
    }

    let total = responses.len();

    options
        .iter()
        .map(|option| {
            let response_count = counts.get(option.id.as_str()).copied().unwrap_or(0);
            let percentage = if total > 0 {
                response_count as f64 * 100.0 / total as f64
            } else {
                0.0
            };

            OptionTally {
                option_id: option.id.clone(),
                content: option.text.clone(),
                response_count,
                percentage,
            }
        })
        .collect()
}

/// Renders one `"<option> - <pct>%"` line per tally, percent to one decimal
/// with halves rounded up.
pub fn percentage_block(tallies: &[OptionTally]) -> String {
    tallies
        .iter()
        .map(|tally| format!("{} - {:.1}%", tally.content, round_to_tenth(tally.percentage)))
        .collect::<Vec<_>>()
        .join("\n")
}

// `{:.1}` alone rounds exact halves to even (1.25 -> "1.2")
fn round_to_tenth(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

/// The most-picked option; ties go to the earlier option.
pub fn leading(tallies: &[OptionTally]) -> Option<&OptionTally> {
    tallies.iter().fold(None, |best: Option<&OptionTally>, tally| match best {
        Some(current) if current.response_count >= tally.response_count => Some(current),
        _ => Some(tally),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(texts: &[&str]) -> Vec<PollOption> {
        texts.iter().map(|text| PollOption::new("poll", *text)).collect()
    }

    fn responses_for(option: &PollOption, n: usize) -> Vec<PollResponse> {
        (0..n)
            .map(|i| PollResponse::new(format!("user-{}-{}", option.id, i), option))
            .collect()
    }

    #[test]
    fn computes_percentages_in_option_order() {
        let opts = options(&["A", "B"]);
        let mut responses = responses_for(&opts[0], 3);
        responses.extend(responses_for(&opts[1], 1));

        let tallies = aggregate(&opts, &responses);

        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].content, "A");
        assert_eq!(tallies[0].response_count, 3);
        assert_eq!(tallies[0].percentage, 75.0);
        assert_eq!(tallies[1].content, "B");
        assert_eq!(tallies[1].percentage, 25.0);
        assert_eq!(percentage_block(&tallies), "A - 75.0%\nB - 25.0%");
    }

    #[test]
    fn no_responses_means_zero_everywhere() {
        let opts = options(&["A", "B", "C"]);
        let tallies = aggregate(&opts, &[]);

        assert!(tallies.iter().all(|t| t.response_count == 0 && t.percentage == 0.0));
        assert_eq!(percentage_block(&tallies), "A - 0.0%\nB - 0.0%\nC - 0.0%");
    }

    #[test]
    fn options_without_responses_default_to_zero() {
        let opts = options(&["A", "B", "C"]);
        let tallies = aggregate(&opts, &responses_for(&opts[1], 2));

        assert_eq!(tallies[0].response_count, 0);
        assert_eq!(tallies[1].percentage, 100.0);
        assert_eq!(tallies[2].percentage, 0.0);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        for counts in [vec![1, 1, 1], vec![7, 0, 2, 5], vec![1, 2, 3, 4, 5, 6, 7], vec![13]] {
            let labels: Vec<String> = (0..counts.len()).map(|i| format!("opt{}", i)).collect();
            let opts: Vec<PollOption> = labels.iter().map(|l| PollOption::new("poll", l.as_str())).collect();
            let responses: Vec<PollResponse> = opts
                .iter()
                .zip(&counts)
                .flat_map(|(opt, n)| responses_for(opt, *n))
                .collect();

            let sum: f64 = aggregate(&opts, &responses).iter().map(|t| t.percentage).sum();
            assert!((sum - 100.0).abs() < 1e-9, "sum was {} for {:?}", sum, counts);
        }
    }

    #[test]
    fn half_tenths_round_up() {
        let opts = options(&["A", "B"]);
        let mut responses = responses_for(&opts[0], 1);
        responses.extend(responses_for(&opts[1], 79));

        let tallies = aggregate(&opts, &responses);

        assert_eq!(tallies[0].percentage, 1.25);
        assert_eq!(percentage_block(&tallies), "A - 1.3%\nB - 98.8%");
    }

    #[test]
    fn leading_prefers_first_on_ties() {
        let opts = options(&["A", "B", "C"]);
        let mut responses = responses_for(&opts[1], 2);
        responses.extend(responses_for(&opts[2], 2));

        let tallies = aggregate(&opts, &responses);
        assert_eq!(leading(&tallies).map(|t| t.content.as_str()), Some("B"));
        assert!(leading(&[]).is_none());
    }
}
