//! Prompt templates for the plausibility assistant

use symcheck_common::{AssistContext, Severity};

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn context_block(ctx: &AssistContext) -> String {
    format!(
        "Disease Name: {}\n\
         Already known Symptoms: {}\n\
         Already excluded Symptoms: {}\n\
         Symptom Description: {}\n\
         Chat History (Previous Questions and Answers):\n{}\n",
        ctx.disease_name,
        join_or_none(&ctx.known_symptoms),
        join_or_none(&ctx.excluded_symptoms),
        ctx.symptom_text.trim(),
        ctx.history_text()
    )
}

/// Prompt for the next yes/no question, or "END" when done.
pub fn question_prompt(ctx: &AssistContext) -> String {
    format!(
        "Generate a single, clear yes/no question to further assess whether the patient has a \
         specific condition. Focus on creating the most relevant question based on the provided \
         symptom description and chat history. If you are finished with your assessment output \"END\".\n\n\
         {}\n\
         If you provide a question, your question should:\n\
         1. Be directly related to the symptom description.\n\
         2. Build logically on the chat history.\n\
         3. Avoid open-ended or explanatory statements.\n\n\
         Output:\n",
        context_block(ctx)
    )
}

/// Prompt for the final plausibility and severity assessment.
pub fn assessment_prompt(ctx: &AssistContext) -> String {
    let states: Vec<String> = Severity::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.prompt_label()))
        .collect();

    format!(
        "Based on the name of the disease, the symptom description and the chat history, please \
         give an assessment, if the diagnosis is plausible and how critical the disease state is.\n\n\
         {}\n\
         Possible Disease States:\n\
         {}\n\n\
         Output:\n",
        context_block(ctx),
        states.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use symcheck_common::assist::Exchange;
    use symcheck_common::Answer;

    fn ctx() -> AssistContext {
        AssistContext {
            disease_name: "Influenza".to_string(),
            known_symptoms: vec!["Fever".to_string(), "Cough".to_string()],
            excluded_symptoms: vec![],
            symptom_text: "High fever and dry cough.".to_string(),
            history: vec![Exchange {
                question: "Do you have muscle aches?".to_string(),
                answer: Answer::Unsure,
            }],
        }
    }

    #[test]
    fn test_question_prompt_fields() {
        let prompt = question_prompt(&ctx());
        assert!(prompt.contains("Disease Name: Influenza"));
        assert!(prompt.contains("Already known Symptoms: Fever, Cough"));
        assert!(prompt.contains("Already excluded Symptoms: none"));
        assert!(prompt.contains("Q: Do you have muscle aches?\nA: I don't know"));
        assert!(prompt.contains("output \"END\""));
    }

    #[test]
    fn test_assessment_prompt_lists_states() {
        let prompt = assessment_prompt(&ctx());
        assert!(prompt.contains("1. Critical, Call an Ambulance"));
        assert!(prompt.contains("4. Non-Critical, Monitor the symptoms"));
        assert!(!prompt.contains("END"));
    }
}
