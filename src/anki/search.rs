use async_trait::async_trait;

use super::AnkiConnect;
use crate::{
    core::{
        KikuConfig,
        KikuError,
    },
    notes::{
        NoteMatches,
        NoteQuery,
        NoteSearch,
    },
};

/// Answers note queries through a running desktop Anki.
///
/// One `findNotes` + `notesInfo` round trip per key, no batching and no
/// caching. Errors are returned as-is; there is nothing further to fall back on.
pub struct AnkiConnectSearch {
    anki: AnkiConnect,
    note_types: Vec<String>,
    expression_field: String,
    reading_field: String,
}

impl AnkiConnectSearch {
    pub fn new(anki: AnkiConnect, config: &KikuConfig) -> Self {
        Self {
            anki,
            note_types: config.note_types.clone(),
            expression_field: config.expression_field.clone(),
            reading_field: config.reading_field.clone(),
        }
    }

    /// `("note:Kiku" OR "note:Lapis")`
    pub fn note_filter(&self) -> String {
        let terms: Vec<String> =
            self.note_types.iter().map(|t| format!("\"note:{}\"", escape(t))).collect();
        format!("({})", terms.join(" OR "))
    }

    pub fn kanji_query(&self, kanji: &str) -> String {
        format!(
            "{} AND \"{}:*{}*\"",
            self.note_filter(),
            self.expression_field,
            escape(kanji)
        )
    }

    pub fn reading_query(&self, reading: &str) -> String {
        format!("{} AND \"{}:{}\"", self.note_filter(), self.reading_field, escape(reading))
    }

    pub fn expression_query(&self, expression: &str) -> String {
        format!("{} AND \"{}:{}\"", self.note_filter(), self.expression_field, escape(expression))
    }
}

/// Escapes characters that Anki's search syntax treats specially inside a
/// quoted term.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '*' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl NoteSearch for AnkiConnectSearch {
    async fn search(&self, query: &NoteQuery) -> Result<NoteMatches, KikuError> {
        let mut result = NoteMatches::default();

        for kanji in &query.kanji_list {
            let notes = self.anki.find_notes_info(&self.kanji_query(kanji)).await?;
            if !notes.is_empty() {
                result.kanji_list_result.insert(kanji.clone(), notes);
            }
        }

        for reading in &query.reading_list {
            let notes = self.anki.find_notes_info(&self.reading_query(reading)).await?;
            if !notes.is_empty() {
                result.reading_list_result.insert(reading.clone(), notes);
            }
        }

        for expression in &query.expression_list {
            let notes = self.anki.find_notes_info(&self.expression_query(expression)).await?;
            if !notes.is_empty() {
                result.expression_list_result.insert(expression.clone(), notes);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "AnkiConnect"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers,
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::notes::scanner::tests::note;

    fn search(address: String) -> AnkiConnectSearch {
        AnkiConnectSearch::new(AnkiConnect::new(address), &KikuConfig::default())
    }

    #[test]
    fn test_query_strings() {
        let search = search("http://127.0.0.1:8765".into());
        assert_eq!(search.kanji_query("日"), r#"("note:Kiku" OR "note:Lapis") AND "Expression:*日*""#);
        assert_eq!(
            search.reading_query("にほん"),
            r#"("note:Kiku" OR "note:Lapis") AND "ExpressionReading:にほん""#
        );
        assert_eq!(
            search.expression_query("日本"),
            r#"("note:Kiku" OR "note:Lapis") AND "Expression:日本""#
        );
        assert_eq!(
            search.expression_query("a*b"),
            r#"("note:Kiku" OR "note:Lapis") AND "Expression:a\*b""#
        );
        assert_eq!(escape(r#"a"b*c"#), r#"a\"b\*c"#);
    }

    #[tokio::test]
    async fn test_search_per_kanji() {
        let server = MockServer::start().await;
        Mock::given(matchers::body_partial_json(serde_json::json!({
            "action": "findNotes",
            "params": { "query": r#"("note:Kiku" OR "note:Lapis") AND "Expression:*日*""# }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": [10], "error": null })),
        )
        .mount(&server)
        .await;
        Mock::given(matchers::body_partial_json(serde_json::json!({
            "action": "findNotes",
            "params": { "query": r#"("note:Kiku" OR "note:Lapis") AND "Expression:*火*""# }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": [], "error": null })),
        )
        .mount(&server)
        .await;
        Mock::given(matchers::body_partial_json(serde_json::json!({
            "action": "notesInfo",
            "params": { "notes": [10] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [note(10, "Kiku", "日本", "にほん")],
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

        let result = search(server.uri())
            .search(&NoteQuery::kanji(vec!["日".into(), "火".into()]))
            .await
            .unwrap();
        assert_eq!(result.kanji_list_result["日"][0].note_id, 10);
        assert!(!result.kanji_list_result.contains_key("火"));
    }
}
