//! Entity extraction: noun phrases from a question, title-cased.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::error::QaError;
use crate::llm::{parse_llm_json, ChatModel, ChatRequest};

#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Candidate entities in order of appearance. Duplicates are kept.
    async fn extract(&self, question: &str) -> Result<Vec<String>, QaError>;

    fn name(&self) -> &'static str;
}

/// Title-case the way Python's `str.title` does: a letter is uppercased when
/// the character before it is not a letter, lowercased otherwise.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }
    out
}

fn normalize_entity(text: &str) -> String {
    title_case(text.trim())
}

// Words that end a noun phrase. Determiners, pronouns, auxiliaries,
// prepositions, conjunctions, question words, and the verbs and adjectives
// that show up between entities in health questions.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "any", "some", "each", "every", "all",
    "my", "your", "his", "her", "its", "our", "their", "i", "you", "he", "she", "it", "we",
    "they", "me", "him", "us", "them", "there", "is", "are", "was", "were", "be", "been",
    "being", "am", "do", "does", "did", "done", "have", "has", "had", "can", "could", "will",
    "would", "should", "shall", "may", "might", "must", "of", "for", "to", "in", "on", "at",
    "by", "with", "without", "from", "into", "about", "between", "against", "among", "over",
    "under", "during", "after", "before", "than", "as", "like", "and", "or", "but", "nor",
    "if", "whether", "not", "no", "what", "which", "who", "whom", "whose", "why", "how",
    "when", "where", "more", "most", "less", "least", "very", "much", "many", "better",
    "worse", "best", "worst", "effective", "safe", "good", "bad", "related", "linked",
    "associated", "compared", "versus", "vs", "treat", "treats", "cause", "causes", "caused",
    "help", "helps", "improve", "improves", "reduce", "reduces", "increase", "increases",
    "prevent", "prevents", "affect", "affects", "lead", "leads", "worsen", "worsens",
    "enhance", "enhances", "predict", "predicts", "influence", "influences", "enable",
    "enables", "facilitate", "facilitates", "correlate", "correlates", "work", "works",
    "option", "risk", "link", "relationship", "connection", "way", "people", "patients",
];

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w][\w'\-]*|[^\w\s]").expect("static regex"))
}

/// Offline noun-phrase chunker.
///
/// A chunk is a maximal run of words containing no stop word and no
/// punctuation. It has no part-of-speech model, so verbs outside the stop
/// list can end up inside a chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NounPhraseChunker;

impl NounPhraseChunker {
    pub fn chunks(question: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for token in word_re().find_iter(question).map(|m| m.as_str()) {
            let is_word = token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
            let is_stop = is_word && STOP_WORDS.contains(&token.to_lowercase().as_str());
            if is_word && !is_stop {
                current.push(token);
            } else if !current.is_empty() {
                chunks.push(normalize_entity(&current.join(" ")));
                current.clear();
            }
        }
        if !current.is_empty() {
            chunks.push(normalize_entity(&current.join(" ")));
        }
        chunks
    }
}

#[async_trait]
impl EntityExtractor for NounPhraseChunker {
    async fn extract(&self, question: &str) -> Result<Vec<String>, QaError> {
        Ok(Self::chunks(question))
    }

    fn name(&self) -> &'static str {
        "chunker"
    }
}

const EXTRACT_SYSTEM: &str = "\
You extract noun phrases from medical questions.
Return JSON only: an array of strings, one per noun phrase, in the order they appear in the question.
Drop leading articles. Do not add phrases that are not in the question.";

/// Asks a chat model for the noun phrases.
pub struct LlmEntityExtractor {
    model: Arc<dyn ChatModel>,
}

impl LlmEntityExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract(&self, question: &str) -> Result<Vec<String>, QaError> {
        let request = ChatRequest::user(format!("Question: {question}"))
            .with_system(EXTRACT_SYSTEM)
            .expect_json();
        let raw = self.model.chat(&request).await?;
        let phrases: Vec<String> = parse_llm_json(&raw)?;
        Ok(phrases
            .iter()
            .map(|p| normalize_entity(p))
            .filter(|p| !p.is_empty())
            .collect())
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChat;

    #[test]
    fn title_case_follows_python_rules() {
        assert_eq!(title_case("lung cancer"), "Lung Cancer");
        assert_eq!(title_case("COVID-19 vaccine"), "Covid-19 Vaccine");
        assert_eq!(title_case("vitamin d3"), "Vitamin D3");
        assert_eq!(title_case("don't"), "Don'T");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn chunker_finds_noun_phrases_in_order() {
        assert_eq!(
            NounPhraseChunker::chunks("Does aspirin treat headache?"),
            vec!["Aspirin", "Headache"]
        );
        assert_eq!(
            NounPhraseChunker::chunks("Is there a link between smoking and lung cancer?"),
            vec!["Smoking", "Lung Cancer"]
        );
        assert_eq!(
            NounPhraseChunker::chunks("Is cognitive behavioral therapy better than medication for depression?"),
            vec!["Cognitive Behavioral Therapy", "Medication", "Depression"]
        );
    }

    #[test]
    fn chunker_keeps_duplicates_and_handles_empty_input() {
        assert_eq!(
            NounPhraseChunker::chunks("stress and stress"),
            vec!["Stress", "Stress"]
        );
        assert!(NounPhraseChunker::chunks("").is_empty());
        assert!(NounPhraseChunker::chunks("Is it?").is_empty());
    }

    #[tokio::test]
    async fn llm_extractor_normalizes_phrases() {
        let chat = Arc::new(ScriptedChat::always(
            "Here you go: [\" aspirin \", \"tension headache\", \"\"]",
        ));
        let ex = LlmEntityExtractor::new(chat.clone());
        assert_eq!(
            ex.extract("Does aspirin help tension headache?").await.unwrap(),
            vec!["Aspirin", "Tension Headache"]
        );
        assert!(chat.requests()[0].json);
    }

    #[tokio::test]
    async fn llm_extractor_rejects_non_json() {
        let ex = LlmEntityExtractor::new(Arc::new(ScriptedChat::always("aspirin, headache")));
        assert!(matches!(ex.extract("q").await, Err(QaError::Llm(_))));
    }
}
