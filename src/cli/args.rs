use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tiller")]
#[command(version)]
#[command(about = "A conversational Git agent driven by LLM tool calling", long_about = None)]
pub struct Cli {
    /// Model to use (e.g. openai/gpt-4o, anthropic/claude-3-5-sonnet)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Working directory for the session (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Task for the agent to carry out
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Continue the last conversation in this directory
    #[arg(long = "continue")]
    pub continue_conversation: bool,

    /// Maximum model round-trips before the loop is stopped
    #[arg(long)]
    pub max_turns: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// List available models
    List,
    /// Show version information
    Version,
    /// Check status of dependencies
    Status,
}
