//! Plain-text rendering for the terminal.

use dotpoint_core::progress::ProgressSummary;

fn mark(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Multi-line summary of one dotpoint's progress.
pub fn progress_text(summary: &ProgressSummary) -> String {
    let filled = usize::from(summary.overall_percent.min(100)) / 5;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled));

    format!(
        "{title} ({id})\n\
         [{bar}] {pct}%\n\
         {learn} Learn  {quiz} Quiz  {practice} Practice\n\
         Sections completed: {sections}\n\
         XP earned: {xp}\n",
        title = summary.display_title(),
        id = summary.dotpoint_id,
        pct = summary.overall_percent,
        learn = mark(summary.flags.learn),
        quiz = mark(summary.flags.quiz),
        practice = mark(summary.flags.practice),
        sections = summary.stats.sections_completed,
        xp = summary.stats.xp_earned,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpoint_core::progress::{CompletionFlags, ProgressStats};

    #[test]
    fn renders_counts_and_bar() {
        let summary = ProgressSummary::new(
            "bio-m5-dp1",
            Some("Cell replication".into()),
            ProgressStats {
                sections_completed: 2,
                xp_earned: 40,
            },
            CompletionFlags {
                learn: true,
                quiz: false,
                practice: false,
            },
        );
        let text = progress_text(&summary);
        assert!(text.starts_with("Cell replication (bio-m5-dp1)\n"));
        assert!(text.contains("[######..............] 33%"));
        assert!(text.contains("[x] Learn  [ ] Quiz  [ ] Practice"));
        assert!(text.contains("Sections completed: 2"));
        assert!(text.contains("XP earned: 40"));
    }

    #[test]
    fn empty_progress_renders_placeholders() {
        let summary = ProgressSummary::new(
            "x",
            None,
            ProgressStats::default(),
            CompletionFlags::default(),
        );
        let text = progress_text(&summary);
        assert!(text.starts_with("— (x)"));
        assert!(text.contains("] 0%"));
        assert!(text.contains("Sections completed: 0"));
    }
}
