use std::io::Write as _;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    load_settings, Completion, DictationChange, Notice, NoticeKind, SchemeAdvisor, SessionError,
    Settings,
};
use shared::domain::{Answer, UiLanguage};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Find government schemes and check eligibility from the terminal")]
struct Cli {
    /// Backend base URL; overrides the settings file.
    #[arg(long)]
    server_url: Option<String>,
    /// Scheme query; prompted for when omitted.
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Interface language, by name or code (e.g. "hindi" or "hi").
    #[arg(long)]
    language: Option<UiLanguage>,
    #[arg(long)]
    top_k: Option<u32>,
    /// Try voice input before falling back to typing.
    #[arg(long)]
    dictate: bool,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = apply_cli(load_settings(), &cli);
    info!(base_url = %settings.base_url, language = %settings.language, "starting advisor");

    let advisor = SchemeAdvisor::from_settings(&settings)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if cli.dictate {
        let notice = match advisor.toggle_dictation().await {
            DictationChange::Unavailable => Some(NoticeKind::DictationUnavailable),
            DictationChange::PermissionDenied => Some(NoticeKind::MicrophoneDenied),
            _ => None,
        };
        if let Some(kind) = notice {
            println!("{}", Notice::localized(kind, settings.language).message);
        }
    }

    let query = match cli.query {
        Some(query) => query,
        None => prompt(&mut lines, "Describe what you need: ")
            .await?
            .unwrap_or_default(),
    };
    advisor.set_query_text(query).await;

    let schemes = match advisor.submit_query().await {
        Ok(Completion::Applied(schemes)) => schemes,
        Ok(_) => bail!("query was superseded"),
        Err(SessionError::EmptyQuery) => {
            println!("{}", Notice::localized(NoticeKind::EmptyQuery, settings.language).message);
            return Ok(());
        }
        Err(err) => return Err(report_failure(&advisor, err).await),
    };

    if schemes.is_empty() {
        println!("No schemes matched your query.");
        return Ok(());
    }
    println!("\nRecommended schemes:");
    for (name, scheme) in schemes.iter() {
        println!("  * {name}");
        if !scheme.reason.is_empty() {
            println!("      {}", scheme.reason);
        }
        if !scheme.url.is_empty() {
            println!("      {}", scheme.url);
        }
    }

    if !ask_yes_no(&mut lines, "\nCheck your eligibility? [y/N] ").await? {
        return Ok(());
    }
    let session = advisor.session();
    if let Err(err) = session.check_eligibility().await {
        return Err(report_failure(&advisor, err).await);
    }

    let sections = session.snapshot().await.questionnaire();
    for section in &sections {
        println!("\n{}", section.scheme);
        for question in &section.questions {
            let answer = Answer::from_checked(
                ask_yes_no(&mut lines, &format!("  {} [y/N] ", question.text)).await?,
            );
            session
                .set_answer(&section.scheme, &question.text, answer)
                .await?;
            if !question.has_follow_ups || !answer.is_yes() {
                continue;
            }

            // Follow-ups are only listed once their parent reads "Yes".
            let visible = session
                .snapshot()
                .await
                .questionnaire()
                .into_iter()
                .find(|s| s.scheme == section.scheme)
                .and_then(|s| s.questions.into_iter().find(|q| q.text == question.text))
                .map(|q| q.visible_follow_ups)
                .unwrap_or_default();
            for follow_up in visible {
                let answer = Answer::from_checked(
                    ask_yes_no(&mut lines, &format!("    {} [y/N] ", follow_up.text)).await?,
                );
                session
                    .set_follow_up_answer(&section.scheme, &question.text, &follow_up.text, answer)
                    .await?;
            }
        }
    }

    let verdict = match session.submit_eligibility().await {
        Ok(Completion::Applied(verdict)) => verdict,
        Ok(_) => bail!("eligibility check was superseded"),
        Err(err) => return Err(report_failure(&advisor, err).await),
    };
    println!("\nEligibility:");
    for (scheme, status) in verdict.iter() {
        println!("  {scheme}: {status}");
    }

    Ok(())
}

fn apply_cli(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(url) = &cli.server_url {
        settings.base_url = url.clone();
    }
    if let Some(location) = &cli.location {
        settings.location = location.clone();
    }
    if let Some(language) = cli.language {
        settings.language = language;
    }
    if let Some(top_k) = cli.top_k {
        settings.top_k = top_k;
    }
    settings
}

async fn report_failure(advisor: &SchemeAdvisor, err: SessionError) -> anyhow::Error {
    if let Some(failure) = advisor.session().snapshot().await.failure {
        println!("{}", failure.notice.message);
    }
    err.into()
}

async fn prompt(lines: &mut StdinLines, text: &str) -> Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

// Blank input and end of input both answer "No".
async fn ask_yes_no(lines: &mut StdinLines, text: &str) -> Result<bool> {
    loop {
        let Some(line) = prompt(lines, text).await? else {
            return Ok(false);
        };
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n."),
        }
    }
}
