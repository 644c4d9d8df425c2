//! Prompt builders for the generation side of the pipeline.
//!
//! These produce the structured text handed to a [`TextGenerator`]; nothing
//! here talks to the network.
//!
//! [`TextGenerator`]: super::TextGenerator

use std::collections::HashMap;

use crate::table::{ColumnClass, Table};

/// One line per column: `- NAME (class)`, in table column order.
pub fn schema_description(table: &Table, classes: &HashMap<String, ColumnClass>) -> String {
    table
        .columns()
        .iter()
        .map(|name| {
            let class = classes
                .get(name)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("- {} ({})", name, class)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The structured analysis prompt: persona and rules, the table schema, the
/// file-name context, retrieved row documents, prior conclusions, and the
/// question. Optional sections are omitted entirely when absent.
pub fn analysis_prompt(
    question: &str,
    schema: &str,
    member_name: &str,
    retrieved_context: Option<&str>,
    prior_conclusions: Option<&str>,
) -> String {
    let mut prompt = String::new();
    prompt.push_str("# ROLE\n");
    prompt.push_str(
        "You are an exploratory data analysis assistant. Translate the user's \
         question into an analysis of the table described below and answer in \
         clear, objective prose grounded only in the provided context.\n\n",
    );
    prompt.push_str("# TABLE SCHEMA\n");
    prompt.push_str(schema);
    prompt.push('\n');
    prompt.push_str(&format!("\n# FILE NAME CONTEXT\n'{}'\n", member_name));
    if let Some(context) = retrieved_context {
        if !context.is_empty() {
            prompt.push_str("\n# RETRIEVED ROWS\n");
            prompt.push_str(context);
            prompt.push('\n');
        }
    }
    if let Some(conclusions) = prior_conclusions {
        if !conclusions.is_empty() {
            prompt.push_str("\n# PRIOR CONCLUSIONS\n");
            prompt.push_str(conclusions);
            prompt.push('\n');
        }
    }
    prompt.push_str("\n# QUESTION\n");
    prompt.push_str(question);
    prompt.push_str("\n\n# ANSWER\n");
    prompt
}

/// Query-clarification prompt: fix typos and sharpen intent without changing
/// meaning. The reply must be the rewritten query alone.
pub fn clarify_prompt(question: &str) -> String {
    format!(
        "# ROLE\n\
         You are a query clarifier. Your only job is to fix typos and make the \
         user's query as clear and direct as possible WITHOUT changing its \
         meaning. Reply with ONLY the corrected query, nothing else.\n\n\
         # EXAMPLES\n\
         USER: \"whats the tipe of each colum?\"\n\
         REPLY: \"What is the type of each column?\"\n\n\
         # ORIGINAL QUERY\n\
         {}\n\n\
         # CLARIFIED QUERY\n",
        question
    )
}

/// Member-context prompt: infer a one-sentence description of each file from
/// its name and header.
pub fn member_context_prompt(members: &[(String, String)]) -> String {
    let mut prompt = String::from(
        "# ROLE\n\
         You are a senior data analyst. Infer the content and context of each \
         data file below from its NAME and HEADER alone. Give a single short \
         sentence per file.\n\n\
         # FILES\n",
    );
    for (name, schema_text) in members {
        prompt.push_str(&format!("- FILE: {} (columns: {})\n", name, schema_text));
    }
    prompt.push_str(
        "\n# INFERENCE\n\
         Reply with a numbered list, one concise sentence per file, focused on \
         what the file represents.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn sample_table() -> (Table, HashMap<String, ColumnClass>) {
        let mut table = Table::new(vec!["NAME".into(), "AGE".into()]);
        table.push_row(vec![Cell::Text("Ana".to_string()), Cell::Number(30.0)]);
        let mut classes = HashMap::new();
        classes.insert("NAME".to_string(), ColumnClass::Text);
        classes.insert("AGE".to_string(), ColumnClass::Numeric);
        (table, classes)
    }

    #[test]
    fn test_schema_description_follows_column_order() {
        let (table, classes) = sample_table();
        assert_eq!(
            schema_description(&table, &classes),
            "- NAME (text)\n- AGE (numeric)"
        );
    }

    #[test]
    fn test_schema_description_marks_unclassified_columns() {
        let (table, _) = sample_table();
        let description = schema_description(&table, &HashMap::new());
        assert!(description.contains("- NAME (unknown)"));
    }

    #[test]
    fn test_analysis_prompt_includes_all_sections() {
        let prompt = analysis_prompt(
            "Which customer is oldest?",
            "- NAME (text)",
            "people.csv",
            Some("Ana 30"),
            Some("The table holds customer ages."),
        );
        assert!(prompt.contains("# TABLE SCHEMA"));
        assert!(prompt.contains("'people.csv'"));
        assert!(prompt.contains("# RETRIEVED ROWS\nAna 30"));
        assert!(prompt.contains("# PRIOR CONCLUSIONS"));
        assert!(prompt.contains("Which customer is oldest?"));
    }

    #[test]
    fn test_analysis_prompt_omits_empty_sections() {
        let prompt = analysis_prompt("q", "- A (numeric)", "f.csv", None, Some(""));
        assert!(!prompt.contains("# RETRIEVED ROWS"));
        assert!(!prompt.contains("# PRIOR CONCLUSIONS"));
    }

    #[test]
    fn test_clarify_prompt_embeds_the_question() {
        let prompt = clarify_prompt("wich colum has misings?");
        assert!(prompt.contains("wich colum has misings?"));
        assert!(prompt.ends_with("# CLARIFIED QUERY\n"));
    }

    #[test]
    fn test_member_context_prompt_lists_every_file() {
        let members = vec![
            ("a.csv".to_string(), "ID, AMOUNT".to_string()),
            ("b.xlsx".to_string(), "NAME".to_string()),
        ];
        let prompt = member_context_prompt(&members);
        assert!(prompt.contains("- FILE: a.csv (columns: ID, AMOUNT)"));
        assert!(prompt.contains("- FILE: b.xlsx (columns: NAME)"));
    }
}
