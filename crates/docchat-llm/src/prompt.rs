//! Prompt composition for retrieval-augmented answering.

use docchat_core::SearchResult;

/// Compose the generation prompt from retrieved passages and the question.
///
/// Passages are joined with blank lines in retrieval order. With nothing
/// retrieved the context section is left empty, and the instructions steer
/// the model toward answering that it does not know.
#[must_use]
pub fn compose_prompt(results: &[SearchResult], question: &str) -> String {
    let context = results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an assistant.\n\
         Use only the retrieved context to precisely answer the question.\n\
         If you don't know the answer, say that you don't know.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn result_with_content(content: &str) -> SearchResult {
        SearchResult {
            chunk_id: "id".to_string(),
            chat_id: Uuid::new_v4(),
            content: content.to_string(),
            score: 0.9,
            chunk_index: 0,
            filename: "notes.txt".to_string(),
        }
    }

    #[test]
    fn test_prompt_with_single_passage() {
        let results = vec![result_with_content("Login uses OAuth tokens.")];
        let prompt = compose_prompt(&results, "How does login work?");

        assert_eq!(
            prompt,
            "You are an assistant.\n\
             Use only the retrieved context to precisely answer the question.\n\
             If you don't know the answer, say that you don't know.\n\
             \n\
             Context:\n\
             Login uses OAuth tokens.\n\
             \n\
             Question: How does login work?\n\
             \n\
             Answer:"
        );
    }

    #[test]
    fn test_passages_joined_with_blank_lines() {
        let results = vec![
            result_with_content("First passage."),
            result_with_content("Second passage."),
        ];
        let prompt = compose_prompt(&results, "question");

        assert!(prompt.contains("Context:\nFirst passage.\n\nSecond passage.\n\nQuestion:"));
    }

    #[test]
    fn test_prompt_with_no_passages() {
        let prompt = compose_prompt(&[], "What is the meaning of life?");

        assert!(prompt.contains("Context:\n\n\nQuestion: What is the meaning of life?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_passages_keep_retrieval_order() {
        let results = vec![
            result_with_content("most relevant"),
            result_with_content("less relevant"),
        ];
        let prompt = compose_prompt(&results, "q");

        let first = prompt.find("most relevant").unwrap();
        let second = prompt.find("less relevant").unwrap();
        assert!(first < second);
    }
}
