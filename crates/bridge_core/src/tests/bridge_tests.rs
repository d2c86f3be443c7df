use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures::FutureExt;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CommandRequest, CommandResult, GREET, INSTALL_PLUGIN, SAY_BYE},
};
use tokio::sync::oneshot;

use super::*;

type Reply = Result<CommandResult, InvokeError>;

#[derive(Default)]
struct ScriptedInvoker {
    issued: Mutex<Vec<CommandRequest>>,
    replies: HashMap<String, Reply>,
}

impl ScriptedInvoker {
    fn reply(mut self, command: &str, reply: Reply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    fn issued(&self) -> Vec<CommandRequest> {
        self.issued.lock().expect("issued lock").clone()
    }
}

#[async_trait]
impl CommandInvoker for ScriptedInvoker {
    async fn invoke(&self, request: CommandRequest) -> Reply {
        self.issued.lock().expect("issued lock").push(request.clone());
        self.replies
            .get(&request.command)
            .cloned()
            .unwrap_or(Ok(CommandResult::Unit))
    }
}

/// Each call waits until the test releases its reply. Calls to the same
/// command take their gates in the order they were opened.
#[derive(Default)]
struct GatedInvoker {
    issued: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<Reply>>>>,
}

impl GatedInvoker {
    fn gate(&self, command: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .expect("gates lock")
            .entry(command.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    fn issued(&self) -> Vec<String> {
        self.issued.lock().expect("issued lock").clone()
    }
}

#[async_trait]
impl CommandInvoker for GatedInvoker {
    async fn invoke(&self, request: CommandRequest) -> Reply {
        self.issued
            .lock()
            .expect("issued lock")
            .push(request.command.clone());
        let gate = self
            .gates
            .lock()
            .expect("gates lock")
            .get_mut(&request.command)
            .and_then(VecDeque::pop_front);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(InvokeError::Transport("gate dropped".into()))),
            None => futures::future::pending().await,
        }
    }
}

fn bridge_with<I: CommandInvoker>(
    invoker: I,
) -> (CommandBridge<I, MemoryDocument>, Arc<MemoryDocument>) {
    let ids = ElementIds::default();
    let document = Arc::new(MemoryDocument::with_elements(ids.all()));
    let handles = BridgeHandles::resolve(&*document, &ids).expect("handles");
    (CommandBridge::new(invoker, document.clone(), handles), document)
}

#[tokio::test]
async fn greet_submission_issues_farewell_then_greeting() {
    let invoker = Arc::new(ScriptedInvoker::default());
    let (bridge, document) = bridge_with(invoker.clone());
    document.set_value("greet-input", "Ada");

    bridge.on_greet_submit(&mut SubmitEvent::new()).await;

    assert_eq!(
        invoker.issued(),
        vec![CommandRequest::say_bye("Ada"), CommandRequest::greet("Ada")]
    );
}

#[tokio::test]
async fn greeting_and_farewell_render_into_their_own_nodes() {
    let invoker = ScriptedInvoker::default()
        .reply(GREET, Ok(CommandResult::Text("Hello, Ada!".into())))
        .reply(SAY_BYE, Ok(CommandResult::Text("Bye!".into())));
    let (bridge, document) = bridge_with(invoker);
    document.set_value("greet-input", "Ada");

    bridge.on_greet_submit(&mut SubmitEvent::new()).await;

    assert_eq!(document.text("greet-msg").as_deref(), Some("Hello, Ada!"));
    assert_eq!(document.text("bye-msg").as_deref(), Some("Bye!"));
    assert_eq!(document.text("plugin-list-msg").as_deref(), Some(""));
}

#[tokio::test]
async fn plugin_list_is_newline_joined() {
    let invoker = ScriptedInvoker::default().reply(
        "get_active_plugins",
        Ok(CommandResult::List(vec!["a".into(), "b".into(), "c".into()])),
    );
    let (bridge, document) = bridge_with(invoker);

    bridge.on_list_plugins_submit(&mut SubmitEvent::new()).await;

    assert_eq!(document.text("plugin-list-msg").as_deref(), Some("a\nb\nc"));
}

#[tokio::test]
async fn install_notice_is_written_before_the_command_resolves() {
    let invoker = Arc::new(GatedInvoker::default());
    let (bridge, document) = bridge_with(invoker.clone());
    document.set_value("plugin-input", "clock");

    let pending = bridge.on_install_submit(&mut SubmitEvent::new());
    assert_eq!(
        document.text("plugin-msg").as_deref(),
        Some(INSTALL_SUCCESS_MESSAGE)
    );
    assert!(pending.now_or_never().is_none());
    assert_eq!(invoker.issued(), vec![INSTALL_PLUGIN.to_string()]);

    document.set_value("plugin-input", "weather");
    let pending = bridge.on_install_submit(&mut SubmitEvent::new());
    assert_eq!(
        document.text("plugin-msg").as_deref(),
        Some(INSTALL_SUCCESS_MESSAGE)
    );
    drop(pending);
}

#[tokio::test]
async fn install_result_value_is_discarded() {
    let invoker = ScriptedInvoker::default()
        .reply(INSTALL_PLUGIN, Ok(CommandResult::Text("ignored".into())));
    let (bridge, document) = bridge_with(invoker);
    document.set_value("plugin-input", "clock");

    bridge.on_install_submit(&mut SubmitEvent::new()).await;

    assert_eq!(
        document.text("plugin-msg").as_deref(),
        Some(INSTALL_SUCCESS_MESSAGE)
    );
}

#[tokio::test]
async fn install_rejection_replaces_the_notice() {
    let invoker = ScriptedInvoker::default().reply(
        INSTALL_PLUGIN,
        Err(InvokeError::Rejected(ApiError::new(
            ErrorCode::Conflict,
            "plugin 'clock' is already installed",
        ))),
    );
    let (bridge, document) = bridge_with(invoker);
    document.set_value("plugin-input", "clock");

    bridge.on_install_submit(&mut SubmitEvent::new()).await;

    assert_eq!(
        document.text("plugin-msg").as_deref(),
        Some("Error: plugin 'clock' is already installed")
    );
}

#[tokio::test]
async fn late_rejection_keeps_the_newer_install_notice() {
    let invoker = Arc::new(GatedInvoker::default());
    let clock_gate = invoker.gate(INSTALL_PLUGIN);
    let weather_gate = invoker.gate(INSTALL_PLUGIN);
    let (bridge, document) = bridge_with(invoker.clone());

    document.set_value("plugin-input", "clock");
    let mut clock = Box::pin(bridge.on_install_submit(&mut SubmitEvent::new()));
    assert!(futures::poll!(&mut clock).is_pending());

    document.set_value("plugin-input", "weather");
    let weather = bridge.on_install_submit(&mut SubmitEvent::new());
    weather_gate
        .send(Ok(CommandResult::Unit))
        .expect("release weather");
    weather.await;

    clock_gate
        .send(Err(InvokeError::Transport("late".into())))
        .expect("release clock");
    clock.await;

    assert_eq!(
        invoker.issued(),
        vec![INSTALL_PLUGIN.to_string(), INSTALL_PLUGIN.to_string()]
    );
    assert_eq!(
        document.text("plugin-msg").as_deref(),
        Some(INSTALL_SUCCESS_MESSAGE)
    );
}

#[tokio::test]
async fn every_form_prevents_default_navigation() {
    let (bridge, _document) = bridge_with(ScriptedInvoker::default());

    for form in [Form::Greet, Form::ListPlugins, Form::InstallPlugin] {
        let mut event = SubmitEvent::new();
        assert!(!event.default_prevented());
        bridge.handle_submit(form, &mut event).await;
        assert!(event.default_prevented(), "{form:?} did not prevent default");
    }
}

#[tokio::test]
async fn outputs_resolve_independently_in_any_order() {
    let invoker = Arc::new(GatedInvoker::default());
    let bye_gate = invoker.gate(SAY_BYE);
    let greet_gate = invoker.gate(GREET);
    let (bridge, document) = bridge_with(invoker.clone());
    document.set_value("greet-input", "Ada");

    let mut event = SubmitEvent::new();
    let mut submission = Box::pin(bridge.on_greet_submit(&mut event));
    assert!(futures::poll!(&mut submission).is_pending());
    assert_eq!(
        invoker.issued(),
        vec![SAY_BYE.to_string(), GREET.to_string()]
    );

    greet_gate
        .send(Ok(CommandResult::Text("Hello, Ada!".into())))
        .expect("release greet");
    assert!(futures::poll!(&mut submission).is_pending());
    assert_eq!(document.text("greet-msg").as_deref(), Some("Hello, Ada!"));
    assert_eq!(document.text("bye-msg").as_deref(), Some(""));
    assert_eq!(document.text("plugin-msg").as_deref(), Some(""));

    bye_gate
        .send(Ok(CommandResult::Text(String::new())))
        .expect("release bye");
    submission.await;
    assert_eq!(document.text("greet-msg").as_deref(), Some("Hello, Ada!"));
    assert_eq!(document.text("bye-msg").as_deref(), Some(""));
}

#[tokio::test]
async fn rejected_greeting_renders_error_without_touching_farewell() {
    let invoker = ScriptedInvoker::default()
        .reply(
            GREET,
            Err(InvokeError::Rejected(ApiError::validation(
                "missing argument 'name' for command 'greet'",
            ))),
        )
        .reply(SAY_BYE, Ok(CommandResult::Text("Bye!".into())));
    let (bridge, document) = bridge_with(invoker);
    document.set_value("greet-input", "hello");

    bridge.on_greet_submit(&mut SubmitEvent::new()).await;

    assert_eq!(
        document.text("greet-msg").as_deref(),
        Some("Error: missing argument 'name' for command 'greet'")
    );
    assert_eq!(document.text("bye-msg").as_deref(), Some("Bye!"));
}

#[tokio::test]
async fn dropped_transport_is_rendered_as_error() {
    let invoker = Arc::new(GatedInvoker::default());
    drop(invoker.gate("get_active_plugins"));
    let (bridge, document) = bridge_with(invoker);

    bridge.on_list_plugins_submit(&mut SubmitEvent::new()).await;

    assert_eq!(
        document.text("plugin-list-msg").as_deref(),
        Some("Error: transport failure: gate dropped")
    );
}

#[test]
fn error_categories_follow_error_codes() {
    let rejected = InvokeError::from(ApiError::new(ErrorCode::Forbidden, "nope"));
    assert_eq!(rejected.category(), ErrorCategory::Forbidden);
    assert_eq!(
        InvokeError::Transport("down".into()).category(),
        ErrorCategory::Transport
    );
    assert_eq!(
        InvokeError::from(ApiError::new(ErrorCode::Internal, "boom")).category(),
        ErrorCategory::Unknown
    );
}

#[test]
fn resolving_handles_reports_the_missing_element() {
    let document = MemoryDocument::with_elements(["greet-input", "greet-msg"]);
    let err = BridgeHandles::resolve(&document, &ElementIds::default()).expect_err("missing");
    assert_eq!(
        err,
        BridgeError::MissingElement(shared::domain::ElementId::new("bye-msg"))
    );
}

#[test]
fn writes_to_unknown_elements_are_ignored() {
    let document = MemoryDocument::with_elements(["a"]);
    assert!(!document.set_value("b", "x"));
    assert_eq!(document.text("b"), None);
    document.insert("b");
    assert!(document.set_value("b", "x"));
    assert_eq!(document.text("b").as_deref(), Some(""));
}
