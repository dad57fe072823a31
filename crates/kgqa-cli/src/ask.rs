use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::Path;

use kgqa_qa::{read_questions, Accuracy, Category, QaOutcome};

use crate::prompt;
use crate::setup::Services;

#[derive(Debug, Clone, Copy, Default)]
pub struct AskOutput {
    pub show_query: bool,
    pub json: bool,
}

pub async fn cmd_ask(
    services: &Services,
    question: Option<&str>,
    category: Option<&str>,
    output: AskOutput,
) -> Result<()> {
    let question = match question {
        Some(q) => q.to_string(),
        None => prompt::read_line("Enter your question: ")?
            .ok_or_else(|| anyhow!("no question given"))?,
    };
    let question = question.trim();
    if question.is_empty() {
        return Err(anyhow!("question is empty"));
    }

    let outcome = match category {
        Some(label) => {
            services
                .qa
                .answer_with_category(question, Category::from_label(label))
                .await?
        }
        None => services.qa.answer(question).await?,
    };
    let answer = synthesize(services, &outcome).await;
    if output.json {
        let mut value = serde_json::to_value(&outcome)?;
        value["context"] = outcome.context().into();
        if let Some(answer) = answer {
            value["answer"] = answer.into();
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_outcome(&outcome, output.show_query);
    if let Some(answer) = answer {
        println!("\n{}", "Answer:".bold());
        println!("{answer}");
    }
    Ok(())
}

pub async fn cmd_batch(services: &Services, input: &Path, limit: usize) -> Result<()> {
    let items = read_questions(input)?;
    let total = items.len();
    let items: Vec<_> = items.into_iter().take(limit).collect();
    println!(
        "{} {} of {} questions from {}",
        "Answering".green().bold(),
        items.len(),
        total,
        input.display()
    );

    let mut accuracy = Accuracy::default();
    let mut failed = 0usize;
    for item in &items {
        let outcome = match services.qa.answer(&item.question).await {
            Ok(outcome) => outcome,
            Err(err) => {
                failed += 1;
                println!("\n--- Question: {} ---", item.question);
                eprintln!("{} {err}", "error:".red().bold());
                continue;
            }
        };
        print_outcome(&outcome, false);
        if let Some(answer) = synthesize(services, &outcome).await {
            println!("\n{}", "Answer:".bold());
            println!("{answer}");
            if let Some(expected) = &item.answer {
                let hit = accuracy.record(expected, &answer);
                let mark = if hit { "match".green() } else { "mismatch".red() };
                println!("  {} expected {expected:?}", mark);
            }
        }
    }

    println!();
    if failed > 0 {
        println!("{} {failed} question(s) failed", "warning:".yellow().bold());
    }
    if let Some(ratio) = accuracy.ratio() {
        println!(
            "{} {}/{} ({:.1}%)",
            "Accuracy:".bold(),
            accuracy.correct,
            accuracy.graded,
            ratio * 100.0
        );
    }
    Ok(())
}

pub fn print_outcome(outcome: &QaOutcome, show_query: bool) {
    println!("\n--- Question: {} ---", outcome.question);
    println!("{} {}", "Category:".bold(), outcome.category.as_str().cyan());
    if !outcome.entities.is_empty() {
        println!("{} {}", "Entities:".bold(), outcome.entities.join(", "));
    }
    if show_query {
        if let Some(query) = &outcome.query {
            println!("{}", "Query:".bold());
            print!("{}", query.to_cypher());
        }
    }
    for warning in &outcome.warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
    println!("{}", "Context:".bold());
    println!("{}", outcome.context());
}

/// Synthesized answer, or `None` when answers are off. Model failures are
/// reported and skipped.
async fn synthesize(services: &Services, outcome: &QaOutcome) -> Option<String> {
    let synthesizer = services.synthesizer.as_ref()?;
    match synthesizer.answer(&outcome.question, &outcome.facts).await {
        Ok(answer) => Some(answer),
        Err(err) => {
            eprintln!("{} answer synthesis failed: {err}", "warning:".yellow().bold());
            None
        }
    }
}
