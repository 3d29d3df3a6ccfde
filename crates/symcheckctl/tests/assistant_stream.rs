//! Streaming replies and prompt wording of the chat assistant

use std::io::Cursor;

use symcheck_common::{AssistContext, AssistError};
use symcheckctl::assistant::read_sse;
use symcheckctl::prompts::{assessment_prompt, question_prompt};

fn collect(stream: &str) -> (Result<String, AssistError>, Vec<String>) {
    let mut chunks = Vec::new();
    let result = read_sse(Cursor::new(stream.as_bytes()), &mut |c: &str| chunks.push(c.to_string()));
    (result, chunks)
}

#[test]
fn test_deltas_are_forwarded_in_order() {
    let stream = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                  data: {\"choices\":[{\"delta\":{\"content\":\"Do you have \"}}]}\n\n\
                  data: {\"choices\":[{\"delta\":{\"content\":\"a stiff neck?\"}}]}\n\n\
                  data: [DONE]\n\n\
                  data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n";
    let (result, chunks) = collect(stream);
    assert_eq!(result.unwrap(), "Do you have a stiff neck?");
    assert_eq!(chunks, vec!["Do you have ", "a stiff neck?"]);
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    let stream = ": keep-alive\n\ndata:{\"choices\":[{\"delta\":{\"content\":\"END\"}}]}\n";
    let (result, _) = collect(stream);
    assert_eq!(result.unwrap(), "END");
}

#[test]
fn test_empty_stream_is_an_error() {
    let (result, chunks) = collect("data: [DONE]\n");
    assert_eq!(result, Err(AssistError::EmptyResponse));
    assert!(chunks.is_empty());
}

#[test]
fn test_malformed_chunk_is_an_http_error() {
    let (result, _) = collect("data: {not json}\n");
    assert!(matches!(result, Err(AssistError::Http(_))));
}

#[test]
fn test_prompts_carry_the_context() {
    let ctx = AssistContext {
        disease_name: "Measles".to_string(),
        known_symptoms: vec!["Fever".to_string()],
        excluded_symptoms: vec!["Cough".to_string()],
        symptom_text: "Rash spreading from the face.".to_string(),
        history: Vec::new(),
    };

    let question = question_prompt(&ctx);
    assert!(question.starts_with("Generate a single, clear yes/no question"));
    assert!(question.contains("Already excluded Symptoms: Cough"));
    assert!(question.contains("Symptom Description: Rash spreading from the face."));
    assert!(question.contains("No previous questions."));

    let assessment = assessment_prompt(&ctx);
    assert!(assessment.contains("Possible Disease States:"));
    assert!(assessment.contains("2. Critical, Visit the local hospital"));
}
