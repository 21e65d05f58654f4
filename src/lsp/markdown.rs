use std::fmt::Write;

/// Incrementally builds Markdown sections shared between hover responses and
/// completion item documentation.
#[derive(Default)]
pub struct MarkdownWriter {
    buffer: String,
    sections: usize,
}

impl MarkdownWriter {
    pub fn is_empty(&self) -> bool {
        self.sections == 0
    }

    pub fn push_text(&mut self, text: impl AsRef<str>) {
        self.start_section();
        self.buffer.push_str(text.as_ref());
    }

    pub fn push_rule(&mut self) {
        self.start_section();
        self.buffer.push_str("---");
    }

    /// A fenced signature block, e.g. a field or method definition line.
    pub fn push_signature(&mut self, signature: &str) {
        self.start_section();
        let _ = writeln!(self.buffer, "```wireview");
        self.buffer.push_str(signature);
        if !signature.ends_with('\n') {
            self.buffer.push('\n');
        }
        let _ = write!(self.buffer, "```");
    }

    pub fn finish(self) -> Option<String> {
        if self.sections == 0 {
            None
        } else {
            Some(self.buffer)
        }
    }

    fn start_section(&mut self) {
        if self.sections > 0 {
            self.buffer.push_str("\n\n");
        }
        self.sections += 1;
    }
}

/// Signature block, then a rule-separated docs section when present.
pub fn signature_with_docs(signature: &str, docs: Option<&str>) -> Option<String> {
    let mut writer = MarkdownWriter::default();
    writer.push_signature(signature);
    push_docs_section(&mut writer, docs);
    writer.finish()
}

pub fn push_docs_section(writer: &mut MarkdownWriter, docs: Option<&str>) {
    if let Some(doc) = docs {
        writer.push_rule();
        writer.push_text(doc);
    }
}
