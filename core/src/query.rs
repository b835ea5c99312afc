use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWord<'a> {
    pub data: &'a str,
    pub is_minus: bool,
    pub is_stop: bool,
}

/// Classify a single query token as a plus or minus word.
pub fn parse_query_word<'a>(text: &'a str, stop_words: &StopWords) -> Result<QueryWord<'a>> {
    if text.is_empty() {
        return Err(SearchError::InvalidQueryWord(String::new()));
    }
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(SearchError::InvalidQueryWord(text.to_string()));
    }
    Ok(QueryWord { data, is_minus, is_stop: stop_words.contains(data) })
}

/// Plus and minus words of a raw query, borrowed from the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

impl<'a> Query<'a> {
    /// Parse `text`. With `dedupe` both word lists come back sorted and unique.
    pub fn parse(text: &'a str, stop_words: &StopWords, dedupe: bool) -> Result<Self> {
        let words = split_into_words(text);
        if words.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let mut query = Query::default();
        for word in words {
            let query_word = parse_query_word(word, stop_words)?;
            if query_word.is_stop {
                continue;
            }
            if query_word.is_minus {
                query.minus_words.push(query_word.data);
            } else {
                query.plus_words.push(query_word.data);
            }
        }
        if dedupe {
            query.plus_words.sort_unstable();
            query.plus_words.dedup();
            query.minus_words.sort_unstable();
            query.minus_words.dedup();
        }
        Ok(query)
    }
}
