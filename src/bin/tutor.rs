use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, error};

use eduapi::prompts;
use eduapi::security::SafeMessage;
use eduapi::{ApiResponse, CallThrottle, GatewayConfig, PromptRequest, SecureGateway, TutorBackend};

// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Ask the learning service for word problems, stories and answers")]
struct Args
{   // Override the model from GEMINI_MODEL / the default
    #[arg(long)]
    model: Option<String>

  , // Send prompts that fail the educational-input whitelist anyway
    #[arg(long, default_value_t = false)]
    allow_any_prompt: bool

  , #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command
{   /// A multiplication or division word problem
    WordProblem
  , /// A new short story with comprehension questions
    Story
  , /// One more paragraph for a story
    ContinueStory
    {   #[arg(long)]
        text: String
    }
  , /// Ask a planet a question
    AskPlanet
    {   #[arg(long, default_value = "Earth"
             , value_parser = clap::builder::PossibleValuesParser::new(prompts::PLANETS))]
        planet: String
      , #[arg(long)]
        question: String
    }
  , /// Send a free-form prompt
    Say
    {   #[arg(long)]
        prompt: String
    }
}

#[tokio::main]
async fn main()
{   env_logger::init();
    let args = Args::parse();
    debug!("tutor args: {:?}", args);

    let mut config = GatewayConfig::from_env();
    if let Some(model) = args.model
    {   config.model = model;
    }
    config.validate_prompt = !args.allow_any_prompt;

    let gateway = match SecureGateway::from_config(&config)
    {   Ok(gateway) => Arc::new(gateway)
      , Err(e) => {
          error!("Cannot start: {}", e);
          std::process::exit(2);
        }
    };
    let throttle = Arc::new(CallThrottle::new(gateway, config.cooldown_ms));
    let backend = TutorBackend::new(throttle);

    match args.command
    {   Command::WordProblem => word_problem(&backend).await
      , Command::Story => story(&backend, config.cooldown_ms).await
      , Command::ContinueStory { text } => {
          print_text(&backend, prompts::continue_story(&text)).await
        }
      , Command::AskPlanet { planet, question } => {
          print_text(&backend, prompts::planet_question(&planet, &question)).await
        }
      , Command::Say { prompt } => {
          print_text(&backend, PromptRequest::text(prompt)).await
        }
    }

    if let Err(e) = backend.shutdown().await
    {   error!("Shutdown failed: {}", e);
    }
}

async fn ask(backend: &TutorBackend, request: PromptRequest)
  -> Option<ApiResponse>
{   backend.ask_and_wait(request.prompt, request.schema).await
}

async fn print_text(backend: &TutorBackend, request: PromptRequest)
{   let Some(response) = ask(backend, request).await
    else
    {   println!("{}", SafeMessage::generic());
        return;
    };
    if let Some(text) = response.as_text()
    {   println!("{}", text);
    }
    else if let Some(value) = response.as_json()
    {   println!("{}", value);
    }
}

async fn word_problem(backend: &TutorBackend)
{   let problem = ask(backend, prompts::word_problem())
      .await
      .and_then(|r| r.decode::<prompts::WordProblem>().ok());
    match problem
    {   Some(p) => {
          println!("{}", p.problem);
          println!("Answer: {}", p.answer);
        }
      , None => println!("Oops! Couldn't create a problem. Please try again.")
    }
}

async fn story(backend: &TutorBackend, cooldown_ms: u64)
{   let story = ask(backend, prompts::new_story())
      .await
      .and_then(|r| r.decode::<prompts::Story>().ok());
    let Some(story) = story
    else
    {   println!("{}", SafeMessage::generic());
        return;
    };
    println!("{}\n\n{}\n", story.story_title, story.story_text);

    // The backend enforces a cooldown between calls.
    tokio::time::sleep(std::time::Duration::from_millis(cooldown_ms + 50)).await;

    let questions = ask(backend, prompts::story_questions(&story.story_text))
      .await
      .and_then(|r| r.decode::<prompts::StoryQuestions>().ok())
      .map(|q| q.questions)
      .unwrap_or_else(prompts::fallback_questions);
    for (i, question) in questions.iter().enumerate()
    {   println!("{}. {}", i + 1, question.q);
    }
}
