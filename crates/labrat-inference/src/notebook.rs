//! Notebook assembly from extracted code cells.

use serde_json::{json, Value as JsonValue};

use labrat_core::{CodeCell, MarkdownCell, NotebookCell, NotebookDocument};

/// Name used when the caller does not supply one.
pub const DEFAULT_NOTEBOOK_NAME: &str = "LabRat_Notebook";

const CONCLUSION: &str = "## Next Steps

- Run each cell in order and check that the output matches what you expect.
- Replace the placeholder data with your own measurements.
- Fill in the TODOs yourself before asking for more hints.
- Write down which assumptions from the drawing the code depends on.";

/// Wrap `cells` in an introduction and a conclusion, keeping their order.
pub fn build_notebook(cells: Vec<CodeCell>, name: &str) -> NotebookDocument {
    let name = match name.trim() {
        "" => DEFAULT_NOTEBOOK_NAME,
        trimmed => trimmed,
    };

    let intro = format!(
        "# {name}\n\nGenerated by the LabRat assistant from a whiteboard analysis. \
         The code below is a starting point for your own exploration, not a finished solution."
    );

    let description = format!("LabRat notebook with {} generated code cells", cells.len());

    let mut notebook_cells = Vec::with_capacity(cells.len() + 2);
    notebook_cells.push(NotebookCell::Markdown(MarkdownCell::new(intro)));
    notebook_cells.extend(cells.into_iter().map(NotebookCell::Code));
    notebook_cells.push(NotebookCell::Markdown(MarkdownCell::new(CONCLUSION)));

    NotebookDocument {
        name: name.to_string(),
        description,
        cells: notebook_cells,
    }
}

fn comment_prefix(language: &str) -> &'static str {
    match language {
        "sql" => "--",
        "javascript" => "//",
        _ => "#",
    }
}

/// Split into nbformat source lines, each keeping its trailing newline
/// except the last.
fn source_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render the document as an nbformat v4 notebook.
pub fn to_ipynb(notebook: &NotebookDocument) -> JsonValue {
    let cells: Vec<JsonValue> = notebook
        .cells
        .iter()
        .map(|cell| match cell {
            NotebookCell::Markdown(markdown) => json!({
                "cell_type": "markdown",
                "metadata": {},
                "source": source_lines(&markdown.content),
            }),
            NotebookCell::Code(code) => {
                let source = match &code.description {
                    Some(description) => format!(
                        "{} {}\n{}",
                        comment_prefix(&code.language),
                        description,
                        code.code
                    ),
                    None => code.code.clone(),
                };
                json!({
                    "cell_type": "code",
                    "execution_count": null,
                    "metadata": { "language": code.language },
                    "outputs": [],
                    "source": source_lines(&source),
                })
            }
        })
        .collect();

    json!({
        "cells": cells,
        "metadata": {
            "kernelspec": {
                "display_name": "Python 3",
                "language": "python",
                "name": "python3"
            },
            "language_info": { "name": "python" },
            "labrat": {
                "name": notebook.name,
                "description": notebook.description
            }
        },
        "nbformat": 4,
        "nbformat_minor": 4
    })
}
