use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::assembler::{ChangelogDocument, SectionBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Print annotated tag messages under release headings.
    pub show_annotations: bool,
    /// Replace the built-in Markdown layout with a Handlebars template.
    pub template: Option<PathBuf>,
}

pub struct ChangelogRenderer {
    template_engine: Handlebars<'static>,
    options: RenderOptions,
}

impl ChangelogRenderer {
    pub fn new(options: RenderOptions) -> Result<Self> {
        let mut template_engine = Handlebars::new();

        // equality helper for templates, e.g. {{#if (eq body "empty")}}
        template_engine.register_helper(
            "eq",
            Box::new(
                |h: &handlebars::Helper,
                 _: &Handlebars,
                 _: &handlebars::Context,
                 _: &mut handlebars::RenderContext,
                 out: &mut dyn handlebars::Output|
                 -> handlebars::HelperResult {
                    let left = h.param(0).map(|v| v.value());
                    let right = h.param(1).map(|v| v.value());

                    if left.is_some() && left == right {
                        out.write("true")?;
                    }
                    Ok(())
                },
            ),
        );

        if let Some(path) = &options.template {
            let template_content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            template_engine.register_template_string("custom", &template_content)?;
        }

        Ok(Self {
            template_engine,
            options,
        })
    }

    pub fn render(&self, document: &ChangelogDocument) -> Result<String> {
        match self.options.format {
            OutputFormat::Markdown => self.render_markdown(document),
            OutputFormat::Json => self.render_json(document),
            OutputFormat::Html => self.render_html(document),
        }
    }

    fn render_markdown(&self, document: &ChangelogDocument) -> Result<String> {
        if self.template_engine.has_template("custom") {
            Ok(self.template_engine.render("custom", document)?)
        } else {
            Ok(self.builtin_markdown(document))
        }
    }

    /// The fixed document layout. Wording and blank-line placement are
    /// part of the output contract, so everything here is literal.
    fn builtin_markdown(&self, document: &ChangelogDocument) -> String {
        let mut output = String::new();

        output.push_str("# Changelog\n\n");
        output.push_str("All notable changes to this project will be documented in this file.\n\n");

        if document.releases.is_empty() {
            output.push_str("No tags found in this repository.\n");
            return output;
        }

        if let Some(body) = &document.unreleased {
            output.push_str("## [Unreleased]\n\n");
            self.push_body(&mut output, body);
        }

        for section in &document.releases {
            output.push_str(&format!(
                "## [{}] - {}\n\n",
                section.release.name,
                section.release.date.format("%Y-%m-%d")
            ));

            if self.options.show_annotations {
                if let Some(annotation) = &section.release.annotation {
                    output.push_str(&format!("**Release Notes:** {annotation}\n\n"));
                }
            }

            self.push_body(&mut output, &section.body);
        }

        output
    }

    fn push_body(&self, output: &mut String, body: &SectionBody) {
        match body {
            SectionBody::Failed(error) => {
                output.push_str(&format!(
                    "Error retrieving commits for this tag: {error}\n\n"
                ));
            }
            SectionBody::Empty => {
                output.push_str("No changes in this release.\n\n");
            }
            SectionBody::Changes(groups) => {
                for group in groups {
                    // the catch-all renders as a bare list, no subheading
                    if !group.catch_all {
                        output.push_str(&format!("### {}\n\n", group.name));
                    }
                    for entry in &group.entries {
                        output.push_str(&format!("- {} {}\n", entry.message, entry.link_tokens()));
                    }
                    output.push('\n');
                }
            }
        }
    }

    fn render_json(&self, document: &ChangelogDocument) -> Result<String> {
        Ok(serde_json::to_string_pretty(document)?)
    }

    fn render_html(&self, document: &ChangelogDocument) -> Result<String> {
        // Markdown first (including any custom template), then convert
        let markdown = self.render_markdown(document)?;
        let parser = pulldown_cmark::Parser::new(&markdown);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Changelog</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; }}
        h1, h2, h3 {{ border-bottom: 1px solid #e1e4e8; padding-bottom: 0.3em; }}
        code {{ background: #f6f8fa; padding: 2px 4px; border-radius: 3px; }}
    </style>
</head>
<body>
    {html}
</body>
</html>"#
        ))
    }
}
