use std::io::{self, BufRead, Write};

use anyhow::Context;
use secrecy::SecretString;
use tracing::warn;

use domains::{Credentials, NewComment, NewThread, Registration, ThreadId, VoteDirection};
use services::{ForumClient, VoteOutcome};

use crate::{Command, VoteCommand};

pub async fn run(client: &ForumClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Register { name, email, password } => {
            let password = password_or_prompt(password)?;
            let user = client
                .register(Registration { name, email, password })
                .await?;
            println!("registered {} <{}> as {}", user.name, user.email, user.id);
        }
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let session = client.login(Credentials { email, password }).await?;
            println!("logged in as {} ({})", session.user.name, session.user.id);
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Whoami => match client.session().await {
            Some(session) => println!(
                "{} <{}> ({})",
                session.user.name, session.user.email, session.user.id
            ),
            None => println!("not logged in"),
        },
        Command::Threads { category } => list_threads(client, category).await?,
        Command::Thread { id } => show_thread(client, &ThreadId::from(id)).await?,
        Command::NewThread { title, body, category } => {
            let thread = client.create_thread(NewThread { title, body, category }).await?;
            println!("created {} [{}] {}", thread.id, thread.category, thread.title);
        }
        Command::Comment { thread_id, content } => {
            let thread_id = ThreadId::from(thread_id);
            let comment = client.create_comment(&thread_id, NewComment { content }).await?;
            println!("commented {} on {}", comment.id, thread_id);
        }
        Command::Vote { target } => vote(client, target).await?,
        Command::Leaderboard => {
            let entries = client.fetch_leaderboards().await?;
            for (rank, entry) in entries.iter().enumerate() {
                println!("{:>3}. {:<24} {:>6}", rank + 1, entry.user.name, entry.score);
            }
        }
    }
    Ok(())
}

async fn list_threads(client: &ForumClient, category: Option<String>) -> anyhow::Result<()> {
    client.fetch_threads().await?;
    // Owner names are cosmetic.
    if let Err(e) = client.fetch_users().await {
        warn!(error = %e, "owner names unavailable");
    }
    client.select_category(category).await;

    println!("categories: {}", client.categories().await.join(", "));
    for thread in client.visible_threads().await {
        let owner = client
            .owner_of(&thread.id)
            .await
            .map(|u| u.name)
            .unwrap_or_else(|| thread.owner_id.to_string());
        println!(
            "{}  [{}] {}  ({:+}, {} comments) by {}",
            thread.id,
            thread.category,
            thread.title,
            thread.score(),
            thread.total_comments,
            owner
        );
    }
    Ok(())
}

async fn show_thread(client: &ForumClient, id: &ThreadId) -> anyhow::Result<()> {
    let detail = client.open_thread(id).await?;

    println!("{} [{}] ({:+})", detail.title, detail.category, detail.score());
    println!("by {} at {}", detail.owner.name, detail.created_at);
    println!();
    println!("{}", detail.body);
    println!();
    println!("{} comments", detail.comments.len());
    for comment in &detail.comments {
        println!(
            "- {} ({:+}) {}: {}",
            comment.id,
            comment.score(),
            comment.owner.name,
            comment.content
        );
    }
    Ok(())
}

async fn vote(client: &ForumClient, target: VoteCommand) -> anyhow::Result<()> {
    // Votes apply to local copies, so load the target first.
    let outcome = match target {
        VoteCommand::Thread { thread_id, direction } => {
            let thread_id = ThreadId::from(thread_id);
            client.fetch_threads().await?;
            client
                .vote_thread(&thread_id, VoteDirection::from(direction))
                .await?
        }
        VoteCommand::Comment {
            thread_id,
            comment_id,
            direction,
        } => {
            let thread_id = ThreadId::from(thread_id);
            client.open_thread(&thread_id).await?;
            client
                .vote_comment(&thread_id, &comment_id.into(), VoteDirection::from(direction))
                .await?
        }
    };
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &VoteOutcome) {
    println!(
        "vote: {}  score: {:+}  (up {}, down {})",
        outcome.intent,
        outcome.score,
        outcome.votes.up_votes_by.len(),
        outcome.votes.down_votes_by.len()
    );
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<SecretString> {
    if let Some(password) = password {
        return Ok(SecretString::from(password));
    }

    eprint!("password: ");
    io::stderr().flush().context("writing prompt")?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading password")?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}
