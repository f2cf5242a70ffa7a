//! Single-pass C renderer for a lowered [`TranslationUnit`]

use std::fmt::Write as _;

use super::ast::{Item, Stmt, TranslationUnit, TreeFunction, VoteFunction};
use super::templates;
use crate::hash_table::{BUCKET_CAPACITY, HASH_TABLE_SIZE};
use crate::request::FIELD_COUNT;
use crate::tokenizer::{MAX_TOKEN_LEN, MIN_TOKEN_LEN};

const INDENT: &str = "    ";

/// Line-oriented source buffer
struct SourceWriter {
    out: String,
}

impl SourceWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn block(&mut self, text: &str) {
        self.out.push_str(text);
    }
}

/// Escape `s` for use inside a C string literal.
///
/// Printable ASCII passes through except `\`, `"` and `?` (trigraphs);
/// every other byte becomes a three-digit octal escape.
pub fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for &b in s.as_bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push('"');
    out
}

/// Make a label safe for a trailing `//` comment.
pub fn comment_text(label: &str) -> String {
    let mut text: String = label
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    // A trailing backslash would splice the next source line into the comment
    while text.ends_with(['\\', ' ']) {
        text.pop();
    }
    while text.contains("??") {
        text = text.replace("??", "? ?");
    }
    text
}

fn render_stmt(w: &mut SourceWriter, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::Return { class_id, label } => match label.as_deref().map(comment_text) {
            Some(text) if !text.is_empty() => {
                w.line(depth, &format!("return {class_id};  // {text}"));
            }
            _ => w.line(depth, &format!("return {class_id};")),
        },
        Stmt::If {
            feature_index,
            threshold,
            then_branch,
            else_branch,
        } => {
            w.line(
                depth,
                &format!("if (features[{feature_index}] <= {threshold:.6}) {{"),
            );
            render_stmt(w, then_branch, depth + 1);
            w.line(depth, "} else {");
            render_stmt(w, else_branch, depth + 1);
            w.line(depth, "}");
        }
    }
}

fn render_tree(w: &mut SourceWriter, f: &TreeFunction) {
    w.line(
        0,
        &format!("static int {}(const float features[MAX_FEATURES]) {{", f.name()),
    );
    render_stmt(w, &f.body, 1);
    w.line(0, "}");
    w.blank();
}

fn render_vote(w: &mut SourceWriter, f: &VoteFunction) {
    let n = f.num_classes;
    w.line(
        0,
        &format!("static int {}(const float features[MAX_FEATURES]) {{", f.name()),
    );
    w.line(1, &format!("int votes[{n}] = {{0}};"));
    for tree in &f.trees {
        w.line(1, &format!("votes[{tree}(features)]++;"));
    }
    w.line(1, "int max_votes = 0;");
    w.line(1, "int predicted_class = 0;");
    w.line(1, &format!("for (int i = 0; i < {n}; i++) {{"));
    w.line(2, "if (votes[i] > max_votes) {");
    w.line(3, "max_votes = votes[i];");
    w.line(3, "predicted_class = i;");
    w.line(2, "}");
    w.line(1, "}");
    w.line(1, "return predicted_class;");
    w.line(0, "}");
    w.blank();
}

fn render_tables(w: &mut SourceWriter, unit: &TranslationUnit) {
    w.line(0, "static const FeatureEntry FEATURE_TABLE[NUM_TERMS] = {");
    for row in unit.table.rows() {
        w.line(
            1,
            &format!("{{ {}, {} }},", c_string_literal(&row.term), row.feature_index),
        );
    }
    w.line(0, "};");
    w.blank();

    // Buckets left out of the initializer are zeroed, i.e. count 0
    w.line(0, "static const HashBucket HASH_BUCKETS[HASH_TABLE_SIZE] = {");
    for (slot, bucket) in unit.table.buckets().iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let indices: Vec<String> = bucket
            .iter()
            .map(|row| row.to_string())
            .chain(std::iter::repeat("-1".to_string()))
            .take(BUCKET_CAPACITY)
            .collect();
        w.line(
            1,
            &format!("[{slot}] = {{ {{ {} }}, {} }},", indices.join(", "), bucket.len()),
        );
    }
    w.line(0, "};");
    w.blank();
}

/// Print the complete `api_classifier.c` source.
pub fn render(unit: &TranslationUnit) -> String {
    let mut w = SourceWriter::new();

    w.line(
        0,
        &format!(
            "/* Generated by {} {}. Do not edit. */",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
    );
    w.blank();
    w.block(templates::INCLUDES);
    w.blank();

    w.line(0, &format!("#define HASH_TABLE_SIZE {HASH_TABLE_SIZE}"));
    w.line(0, &format!("#define BUCKET_CAPACITY {BUCKET_CAPACITY}"));
    w.line(0, &format!("#define MAX_FEATURES {}", unit.max_features));
    w.line(0, &format!("#define NUM_TERMS {}", unit.table.rows().len()));
    w.line(0, &format!("#define NUM_INPUTS {FIELD_COUNT}"));
    w.line(0, &format!("#define TOKEN_BUFFER_SIZE {}", MAX_TOKEN_LEN + 1));
    w.line(0, &format!("#define MIN_TOKEN_LEN {MIN_TOKEN_LEN}"));
    w.blank();

    w.block(templates::TYPEDEFS);
    w.blank();
    render_tables(&mut w, unit);
    w.block(templates::HASH_STRING);
    w.blank();
    w.block(templates::FIND_FEATURE);
    w.blank();
    w.block(templates::TOKENIZER);
    w.blank();

    for item in &unit.items {
        match item {
            Item::Tree(f) => render_tree(&mut w, f),
            Item::Vote(f) => render_vote(&mut w, f),
        }
    }

    w.block(templates::MAIN);
    w.out
}
