//! # Docflow CLI
//!
//! Usage:
//!   docflow input.json -o commands.json
//!   echo '{ ... }' | docflow
//!   docflow input.json --layout
//!   docflow --example > letter.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use docflow::error::Result;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_letter_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {e}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let input = read_input(args)?;
    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());

    let output = if args.iter().any(|a| a == "--layout") {
        let (document, summary) = docflow::layout_json(&input)?;
        let dump = serde_json::json!({ "summary": summary, "body": document.body });
        serde_json::to_string_pretty(&dump)?
    } else {
        let list = docflow::render_json(&input)?;
        serde_json::to_string_pretty(&list)?
    };

    match output_path {
        Some(path) => {
            fs::write(&path, &output)?;
            eprintln!("✓ Written {} bytes to {}", output.len(), path);
        }
        None => println!("{output}"),
    }
    Ok(())
}

fn read_input(args: &[String]) -> Result<String> {
    let path = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, a)| !a.starts_with('-') && args[i - 1] != "-o")
        .map(|(_, a)| a.as_str());

    let input = match path {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(input)
}

fn example_letter_json() -> &'static str {
    r##"{
  "section": { "pageWidth": 816, "marginLeft": 96, "marginRight": 96, "marginTop": 96 },
  "styles": [
    { "id": "Normal", "run": { "fontFamily": "Georgia", "fontSize": 12 } },
    { "id": "Heading1", "basedOn": "Normal", "run": { "bold": true, "fontSize": 20 },
      "paragraph": { "spacingAfter": 12 } },
    { "id": "ListParagraph", "basedOn": "Normal", "paragraph": { "indentation": 24, "hanging": 24 } }
  ],
  "numberings": [
    { "id": 1, "levels": [{ "format": "decimal", "text": "%1." }] }
  ],
  "body": [
    { "type": "paragraph", "props": { "style": "Heading1" },
      "runs": [{ "type": "text", "texts": ["Quarterly report"] }] },
    { "type": "paragraph", "props": { "style": "Normal", "justification": "both" },
      "runs": [
        { "type": "text", "texts": ["Revenue grew in every region this quarter. "] },
        { "type": "text", "props": { "bold": true }, "texts": ["Europe"] },
        { "type": "text", "texts": [" led the way, with the new office opening ahead of schedule."] }
      ] },
    { "type": "paragraph", "props": { "style": "ListParagraph", "numbering": { "numId": 1 } },
      "runs": [{ "type": "text", "texts": ["Hire two support engineers"] }] },
    { "type": "paragraph", "props": { "style": "ListParagraph", "numbering": { "numId": 1 } },
      "runs": [{ "type": "text", "texts": ["Close the Berlin lease"] }] },
    { "type": "table",
      "style": {
        "borders": {
          "top": { "type": "single" }, "bottom": { "type": "single" },
          "start": { "type": "single" }, "end": { "type": "single" }
        },
        "margins": { "start": 4, "end": 4, "top": 2, "bottom": 2 }
      },
      "columns": [{ "width": 312 }, { "width": 312 }],
      "rows": [
        { "cells": [
          { "shading": "dddddd", "paragraphs": [{ "runs": [{ "type": "text", "props": { "bold": true }, "texts": ["Region"] }] }] },
          { "shading": "dddddd", "paragraphs": [{ "runs": [{ "type": "text", "props": { "bold": true }, "texts": ["Growth"] }] }] }
        ] },
        { "cells": [
          { "paragraphs": [{ "runs": [{ "type": "text", "texts": ["Europe"] }] }] },
          { "paragraphs": [{ "runs": [{ "type": "text", "texts": ["12%"] }] }] }
        ] }
      ] }
  ]
}
"##
}
