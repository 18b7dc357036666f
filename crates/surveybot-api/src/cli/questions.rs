//! `surveybot questions`: print the loaded survey.

use anyhow::Result;
use console::style;
use surveybot_core::survey::Survey;

pub fn print_questions(survey: &Survey, json: bool) -> Result<()> {
    if json {
        let questions: Vec<&str> = survey.questions().iter().map(|q| q.text.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    println!();
    for index in 0..survey.len() {
        if let Some(prompt) = survey.prompt(index) {
            println!("  {}", prompt.text);
        }
    }
    println!();
    println!(
        "  {} {} questions, answered on a 1-5 scale",
        style("•").dim(),
        survey.len()
    );
    if !survey.fits_row() {
        println!(
            "  {} more questions than a record row holds; trailing answers are not stored",
            style("!").yellow().bold()
        );
    }
    println!();
    Ok(())
}
