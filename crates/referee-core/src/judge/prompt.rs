//! Instruction builders for the two oracle calls.
//!
//! The wording is part of the judging contract: classification behavior was
//! calibrated against these exact texts, so they are reproduced verbatim.

use crate::oracle::ChatMessage;

pub fn coarse_type_instructions(question: &str, answer: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"You are reviewing a single-turn conversation between a user and an assistant.

    You must classify the assistant's response according to the **type of response strategy** used.

    Here are the definitions:

    - `answer_attempt`: The assistant **unambiguously commits** to at least one interpretation of the user’s question and provides a factual explanation or general background relevant to the query. It must **not use any hedging language**, such as “if you mean…”, “depending on…”, or “could be…”. Implicit or explicit hedging disqualifies it from this category. It may mention multiple entities, as long as none are introduced with hedging or conditional phrasing.

    - `clarification`: The assistant **asks for more information** about the user’s intent. This may involve **one or more clarification questions**, but must not **suggest answers** or list **interpretations**,. The response must should **not contain hedging or speculative language**.

    - `hedge`: The assistant **uses hedging or conditional language** (e.g., “if you meant X…”, “could refer to…”, “might be…”) and does not fully commit to a single interpretation. Even if only one entity is mentioned, the presence of such language marks it as a hedge.

    - `refuse`: The assistant explicitly or implicitly refuses to answer the question and does **not** ask any follow-up questions.

    - `missing`: The assistant gives **no response at all**.

    You must output your answer in the following JSON format:
    {{"response_type": "refuse|missing|answer_attempt|hedge|clarification"}}

    Conversation:
    Question: {question}
    Answer: {answer}"#
    );
    vec![ChatMessage::user(prompt)]
}

pub fn mentioned_entities_instructions(entities: &[String], answer: &str) -> Vec<ChatMessage> {
    let system = "You are an expert in identifying explicit entity mentions in text.\n\n\
        Your task is to determine which of the listed entities are explicitly mentioned in the response.\n\n\
        Instructions:\n\
        - Return only entities from the provided list (use their exact spelling from the list in your output).\n\
        - Consider an entity 'mentioned' if the response text contains the entity exactly, or with minor morphological or spelling variations.\n\
        \x20 Examples of acceptable variations include plural forms and misspellings.\n\
        - Do not infer mentions from implied meaning, associations, or unrelated paraphrasing.\n\
        - Only include entities that are clearly and explicitly present in the response text.\n\
        - **Always** output the entity names exactly as they appear in the provided list.\n";

    let user = format!(
        "Entities: {}\nResponse:\n\n{}\n\nWhich of the listed entities are explicitly mentioned in the response?",
        entity_list(entities),
        answer.trim()
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Bracketed, single-quoted list, the format the extraction prompt was
/// calibrated with.
fn entity_list(entities: &[String]) -> String {
    let quoted: Vec<String> = entities.iter().map(|e| format!("'{}'", e)).collect();
    format!("[{}]", quoted.join(", "))
}
