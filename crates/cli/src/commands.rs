//! CLI commands

use anyhow::{Result, bail};
use clap::Subcommand;
use kipesa_core::{ClientConfig, FileStore};
use kipesa_http::types::{
    BudgetCreate, ChatbotFeedback, ExpenseCreate, IncomeSourceCreate, Language, RegisterRequest,
    SavingsGoalCreate,
};
use kipesa_http::{ApiClient, AuthService, ChatSession, FinanceService, Session};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and persist the access token
    Login {
        email: String,

        /// Account password
        #[arg(long, env = "KIPESA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Register {
        email: String,

        /// Account password
        #[arg(long, env = "KIPESA_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        phone_number: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Preferred language (en or sw)
        #[arg(long)]
        language: Option<Language>,
    },

    /// Forget the persisted access token
    Logout,

    /// Show the signed-in user's profile
    Profile,

    /// Income, expenses, budgets and savings goals
    Finance {
        #[command(subcommand)]
        command: FinanceCommands,
    },

    /// Send a message to the financial assistant
    Chat {
        message: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,

        /// Conversation language (en or sw)
        #[arg(long, default_value = "en")]
        language: Language,
    },

    /// Chatbot metadata and feedback
    Chatbot {
        #[command(subcommand)]
        command: ChatbotCommands,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum FinanceCommands {
    /// List income sources
    Income,

    /// Record an income source
    AddIncome {
        name: String,
        amount: f64,

        /// e.g. monthly, weekly
        #[arg(long)]
        frequency: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List expenses
    Expenses,

    /// Record an expense
    AddExpense {
        amount: f64,
        category: String,

        /// Date of the expense (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// List budgets
    Budgets,

    /// Create a budget
    AddBudget {
        amount: f64,
        category: String,

        #[arg(long, default_value = "monthly")]
        period: String,
    },

    /// List savings goals
    Goals,

    /// Create a savings goal
    AddGoal {
        target_amount: f64,

        /// Date to reach the goal by (YYYY-MM-DD)
        #[arg(long)]
        target_date: String,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ChatbotCommands {
    /// Show a stored conversation
    History { conversation: String },

    /// Rate an assistant message
    Feedback {
        conversation: String,
        message_id: String,

        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        #[arg(long)]
        comment: Option<String>,

        /// Mark the answer as not helpful
        #[arg(long)]
        unhelpful: bool,
    },

    /// Aggregate usage statistics
    Analytics {
        #[arg(long)]
        start_date: Option<String>,

        #[arg(long)]
        end_date: Option<String>,
    },

    /// Supported languages
    Languages,

    /// Supported intents
    Intents,

    /// Chatbot service health
    Health,
}

/// Client, session and token store built from configuration
struct Context {
    client: ApiClient,
    auth: AuthService,
}

impl Context {
    fn new(config: &ClientConfig) -> Result<Self> {
        let client = ApiClient::from_config(config, Session::new())?;
        let store = Arc::new(FileStore::new(config.state_dir()));
        let auth = AuthService::new(client.clone(), store).with_token_key(&config.token_key);
        Ok(Self { client, auth })
    }

    /// Load the persisted token, failing when there is none
    async fn require_login(&self) -> Result<()> {
        if self.auth.restore().await?.is_none() {
            bail!("Not logged in; run `kipesa login` first");
        }
        Ok(())
    }

    /// Load the persisted token if there is one
    async fn optional_login(&self) {
        if let Err(e) = self.auth.restore().await {
            warn!(error = %e, "Continuing without a session");
        }
    }
}

impl Commands {
    pub async fn execute(self, config: ClientConfig) -> Result<()> {
        let ctx = Context::new(&config)?;

        match self {
            Commands::Login { email, password } => {
                ctx.auth.login(&email, &password).await?;
                match ctx.auth.user() {
                    Some(user) => print_json(&user),
                    None => {
                        println!("Logged in as {email}");
                        Ok(())
                    }
                }
            }
            Commands::Register {
                email,
                password,
                full_name,
                phone_number,
                location,
                language,
            } => {
                let request = RegisterRequest {
                    email,
                    password,
                    full_name,
                    phone_number,
                    location,
                    language: language.map(|l| l.code().to_string()),
                    ..RegisterRequest::default()
                };
                let user = ctx.auth.register(&request).await?;
                info!(user_id = user.id, "Account created");
                print_json(&user)
            }
            Commands::Logout => {
                ctx.auth.logout().await;
                println!("Logged out");
                Ok(())
            }
            Commands::Profile => {
                ctx.require_login().await?;
                match ctx.auth.user() {
                    Some(user) => print_json(&user),
                    None => bail!("Profile unavailable"),
                }
            }
            Commands::Finance { command } => {
                ctx.require_login().await?;
                command
                    .execute(&FinanceService::new(ctx.client.clone()))
                    .await
            }
            Commands::Chat {
                message,
                conversation,
                language,
            } => {
                ctx.optional_login().await;
                let mut chat = ChatSession::new(ctx.client.clone());
                if let Some(id) = conversation {
                    chat.load_history(&id).await?;
                }
                chat.set_language(language);

                match chat.send(&message).await? {
                    Some(reply) => {
                        println!("{}", reply.message);
                        eprintln!("conversation: {}", reply.conversation_id);
                        Ok(())
                    }
                    None => bail!("Message is empty"),
                }
            }
            Commands::Chatbot { command } => {
                ctx.optional_login().await;
                command.execute(&ctx.client).await
            }
            Commands::Config => {
                println!("{}", config::render(&config)?);
                Ok(())
            }
        }
    }
}

impl FinanceCommands {
    pub async fn execute(self, finance: &FinanceService) -> Result<()> {
        match self {
            FinanceCommands::Income => print_json(&finance.fetch_income_sources().await?),
            FinanceCommands::AddIncome {
                name,
                amount,
                frequency,
                description,
            } => {
                let source = IncomeSourceCreate {
                    name,
                    amount,
                    frequency,
                    description,
                };
                print_json(&finance.create_income_source(&source).await?)
            }
            FinanceCommands::Expenses => print_json(&finance.fetch_expenses().await?),
            FinanceCommands::AddExpense {
                amount,
                category,
                date,
                description,
            } => {
                let expense = ExpenseCreate {
                    amount,
                    category,
                    description,
                    date,
                };
                print_json(&finance.create_expense(&expense).await?)
            }
            FinanceCommands::Budgets => print_json(&finance.fetch_budgets().await?),
            FinanceCommands::AddBudget {
                amount,
                category,
                period,
            } => {
                let budget = BudgetCreate {
                    amount,
                    category,
                    period,
                };
                print_json(&finance.create_budget(&budget).await?)
            }
            FinanceCommands::Goals => print_json(&finance.fetch_savings_goals().await?),
            FinanceCommands::AddGoal {
                target_amount,
                target_date,
                description,
            } => {
                let goal = SavingsGoalCreate {
                    target_amount,
                    description,
                    target_date,
                };
                print_json(&finance.create_savings_goal(&goal).await?)
            }
        }
    }
}

impl ChatbotCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            ChatbotCommands::History { conversation } => {
                print_json(&client.conversation_history(&conversation).await?)
            }
            ChatbotCommands::Feedback {
                conversation,
                message_id,
                rating,
                comment,
                unhelpful,
            } => {
                let feedback = ChatbotFeedback {
                    conversation_id: conversation,
                    message_id,
                    rating,
                    feedback: comment,
                    helpful: !unhelpful,
                };
                let ack = client.submit_feedback(&feedback).await?;
                println!("{}", ack.message);
                Ok(())
            }
            ChatbotCommands::Analytics {
                start_date,
                end_date,
            } => print_json(
                &client
                    .analytics(start_date.as_deref(), end_date.as_deref())
                    .await?,
            ),
            ChatbotCommands::Languages => print_json(&client.supported_languages().await?),
            ChatbotCommands::Intents => print_json(&client.supported_intents().await?),
            ChatbotCommands::Health => print_json(&client.chatbot_health().await?),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
