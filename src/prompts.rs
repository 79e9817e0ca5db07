//! Evaluation instruction sent with the answer sheets.
//!
//! The rubric is a natural-language contract with the grading service. The
//! rules about unattempted questions are enforced only by the service's
//! reading of this text; nothing here re-scores the report.
//!
//! Callers can replace the rubric via
//! [`crate::config::EvaluationConfig::system_prompt`]; the maximum marks and
//! the question text are appended either way.

/// Used in place of the question text when none was extracted or entered.
pub const QUESTION_TEXT_PLACEHOLDER: &str = "Questions from uploaded PDF";

/// Default rubric. `{max_marks}` is substituted before use.
pub const DEFAULT_RUBRIC: &str = r#"Evaluate the following answer sheet images based on the provided questions.

IMPORTANT RULES TO FOLLOW STRICTLY:
1. First identify each question in the answer sheet and determine if it has been attempted or not.
2. For ANY question identified as "not attempted", you MUST:
   - Assign EXACTLY 0 marks
   - State "Question not attempted" in the analysis
   - Do NOT provide any marks for these questions
3. NEVER assign any marks (not even 1) to unattempted questions.
4. Ensure your marks breakdown is consistent with your analysis.

Assign marks out of {max_marks} for the entire paper, considering only attempted questions.

For questions that are attempted:
- Evaluate the answer quality objectively
- Assign appropriate marks based on correctness and completeness
- Provide detailed feedback on strengths and weaknesses

Format the response in markdown with these sections:
- Overall marks (sum of all question marks)
- Breakdown of marks per question (with 0 marks for unattempted questions)
- Strengths of the answers (only for attempted questions)
- Areas for improvement
- Specific feedback for each question

Use emojis where appropriate to make the report engaging."#;

/// Build the full evaluation instruction.
pub fn evaluation_instruction(max_marks: u32, question_text: &str, rubric: Option<&str>) -> String {
    let template = rubric.unwrap_or(DEFAULT_RUBRIC);
    let mut out = template.replace("{max_marks}", &max_marks.to_string());

    // A custom rubric may not mention the maximum at all.
    if !template.contains("{max_marks}") {
        out.push_str(&format!("\n\nMaximum marks for the paper: {max_marks}."));
    }

    let questions = if question_text.trim().is_empty() {
        QUESTION_TEXT_PLACEHOLDER
    } else {
        question_text
    };
    out.push_str("\n\nQuestions:\n");
    out.push_str(questions);
    out
}
