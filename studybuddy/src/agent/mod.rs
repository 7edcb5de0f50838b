//! Agent module: configuration, execution loop and delegation.
//!
//! - **[`Agent`]** is a configuration bundle: name, instructions, its own
//!   model, tools and the delegates it may call.
//! - **[`Runner`]** is a stateless execution engine that drives an agent
//!   through a tool-calling loop (ask model → run tools → repeat) until the
//!   model answers with text.
//! - **[`Delegate`]** is the explicit capability one agent grants another:
//!   `{ name, invoke(query) -> response }`. Delegates registered with
//!   [`Agent::can_call`] are offered to the model as functions taking a
//!   single `task` string.
//!
//! # Example
//!
//! ```rust,ignore
//! use studybuddy::agent::{Agent, Runner, RunConfig};
//!
//! let helper = Arc::new(Agent::new("helper").instructions("...").provider(model.clone()));
//! let main = Agent::new("main")
//!     .instructions("You are a helpful assistant.")
//!     .provider(model)
//!     .can_call(helper);
//!
//! let response = Runner::run(&main, "hello", RunConfig::default()).await?;
//! println!("{}", response.text);
//! ```

mod config;
mod delegate;
mod result;
mod runner;

pub use config::{Agent, DEFAULT_MAX_STEPS};
pub use delegate::{Delegate, DelegateRegistry, SharedDelegate};
pub use result::{AgentResponse, RunConfig, ToolCallRecord};
pub use runner::Runner;
