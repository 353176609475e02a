//! Prompt text for each phase step.
//!
//! Every prompt ends with the same footer: where to write the artifact (if
//! any) and the exact progress line to append once done. Agents treat the
//! footer as a checklist, and the orchestrator relies on it.

use std::path::Path;

use gumploop_models::ProgressEvent;

/// Prefix of the footer line naming the artifact path.
pub const OUTPUT_FILE_LABEL: &str = "Output file: ";

fn footer(output: Option<&Path>, log: &Path, event: &ProgressEvent) -> String {
    let mut text = String::new();
    if let Some(path) = output {
        text.push_str(&format!("{}{}\n", OUTPUT_FILE_LABEL, path.display()));
    }
    text.push_str(&format!(
        "When you are done, append exactly this line to {}:\n{}",
        log.display(),
        event.to_json_line()
    ));
    text
}

fn with_feedback(body: String, feedback: Option<&str>) -> String {
    match feedback {
        Some(notes) if !notes.trim().is_empty() => format!(
            "{}\n\nAddress this reviewer feedback from the previous round:\n{}\n",
            body,
            notes.trim()
        ),
        _ => body,
    }
}

/// Where a step writes and what it reports.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub output: Option<&'a Path>,
    pub log: &'a Path,
    pub event: &'a ProgressEvent,
}

impl Step<'_> {
    fn finish(&self, body: String) -> String {
        format!("{}\n\n{}", body.trim_end(), footer(self.output, self.log, self.event))
    }
}

pub fn plan(step: Step<'_>, task: &str, feedback: Option<&str>) -> String {
    let body = format!(
        "You are the implementer. Write a concrete implementation plan for this task:\n\n{}\n\n\
         Cover the files to change, the approach, risks and how it will be tested. \
         Write the complete plan as markdown to the output file, replacing any earlier version.",
        task
    );
    step.finish(with_feedback(body, feedback))
}

pub fn plan_review(step: Step<'_>, role: &str, plan: &Path) -> String {
    let body = format!(
        "You are the {} reviewer. Review the implementation plan in {}.\n\n\
         Write your review to the output file. End it with APPROVED if the plan can be \
         implemented as written, or NEEDS_REVISION followed by the required changes.",
        role,
        plan.display()
    );
    step.finish(body)
}

pub fn implement(step: Step<'_>, plan: &Path, feedback: Option<&str>) -> String {
    let body = format!(
        "You are the implementer. Implement the approved plan in {} in this repository. \
         Make the code changes directly.",
        plan.display()
    );
    step.finish(with_feedback(body, feedback))
}

pub fn code_review(step: Step<'_>, plan: &Path) -> String {
    let body = format!(
        "You are the technical reviewer. Review the working-tree changes against the plan in {}.\n\n\
         Write your review to the output file. End it with APPROVED if the change is correct \
         and complete, or NEEDS_REVISION followed by the required fixes.",
        plan.display()
    );
    step.finish(body)
}

pub fn run_tests(step: Step<'_>) -> String {
    let body = "You are the technical reviewer. Run the project's full test suite.\n\n\
                Write the command you ran and a summary of the results to the output file. \
                End it with TESTS_PASSED if every test passed, otherwise TESTS_FAILED."
        .to_string();
    step.finish(body)
}

pub fn analyze_failure(step: Step<'_>, results: &Path) -> String {
    let body = format!(
        "You are the technical reviewer. The last test run failed; its report is in {}.\n\n\
         Find the root cause of each failure and write a bug analysis with concrete fix \
         instructions to the output file. Do not change any code.",
        results.display()
    );
    step.finish(body)
}

pub fn apply_fix(step: Step<'_>, analysis: &Path) -> String {
    let body = format!(
        "You are the implementer. Fix the bugs described in {}. Make the code changes directly.",
        analysis.display()
    );
    step.finish(body)
}

pub fn explore(step: Step<'_>, role: &str, goal: &str, feedback: Option<&str>) -> String {
    let body = format!(
        "You are the {} on this team. {}\n\n\
         Investigate independently from your own perspective and write your findings as \
         markdown to the output file.",
        role, goal
    );
    step.finish(with_feedback(body, feedback))
}

pub fn synthesize(step: Step<'_>, findings: &[&Path]) -> String {
    let list: Vec<String> = findings
        .iter()
        .map(|p| format!("- {}", p.display()))
        .collect();
    let body = format!(
        "You are the implementer. Merge these independent findings into one summary, \
         keeping points of agreement and calling out disagreements:\n{}\n\n\
         Write the summary to the output file.",
        list.join("\n")
    );
    step.finish(body)
}

pub fn consensus_review(step: Step<'_>, role: &str, summary: &Path) -> String {
    let body = format!(
        "You are the {} reviewer. Read the summary in {} and check it against your own findings.\n\n\
         Write your assessment to the output file. End it with APPROVED if you agree with the \
         summary, or NEEDS_REVISION followed by what is wrong or missing.",
        role,
        summary.display()
    );
    step.finish(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_has_output_and_event() {
        let event = ProgressEvent::new("claude", "plan_written", 2);
        let step = Step {
            output: Some(Path::new("/w/.gumploop/plan.md")),
            log: Path::new("/w/.gumploop/progress.jsonl"),
            event: &event,
        };
        let text = plan(step, "add dark mode", None);
        assert!(text.contains("add dark mode"));
        assert!(text.contains("Output file: /w/.gumploop/plan.md\n"));
        assert!(text.ends_with(r#"{"agent":"claude","action":"plan_written","iteration":2}"#));
    }

    #[test]
    fn test_feedback_is_included() {
        let event = ProgressEvent::new("claude", "code_written", 2);
        let step = Step {
            output: None,
            log: Path::new("/w/.gumploop/progress.jsonl"),
            event: &event,
        };
        let text = implement(step, Path::new("/w/.gumploop/plan.md"), Some("NEEDS_REVISION: tests"));
        assert!(text.contains("NEEDS_REVISION: tests"));
        assert!(!text.contains(OUTPUT_FILE_LABEL));
    }
}
