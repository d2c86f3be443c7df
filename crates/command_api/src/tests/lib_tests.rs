use super::*;

#[tokio::test]
async fn greet_uses_configured_app_name() {
    let ctx = ApiContext::new(PluginManager::default(), "Fomi");
    assert_eq!(
        greet(&ctx, "Ada").await,
        "Hello, Ada! You've been greeted from Fomi!"
    );
}

#[tokio::test]
async fn say_bye_only_answers_a_hello() {
    assert_eq!(say_bye("well HeLLo there").await, "Bye!");
    assert_eq!(say_bye("Ada").await, "");
    assert_eq!(say_bye("").await, "");
}

#[tokio::test]
async fn dispatch_routes_each_command() {
    let ctx = ApiContext::default();

    let greeting = dispatch(&ctx, &CommandRequest::greet("Ada"))
        .await
        .expect("greet");
    assert_eq!(
        greeting,
        CommandResult::Text("Hello, Ada! You've been greeted from Rust!".into())
    );

    let bye = dispatch(&ctx, &CommandRequest::say_bye("hello"))
        .await
        .expect("say_bye");
    assert_eq!(bye, CommandResult::Text("Bye!".into()));

    let installed = dispatch(&ctx, &CommandRequest::install_plugin("clock"))
        .await
        .expect("install");
    assert_eq!(installed, CommandResult::Unit);

    let listed = dispatch(&ctx, &CommandRequest::get_active_plugins())
        .await
        .expect("list");
    assert_eq!(listed, CommandResult::List(vec!["clock".into()]));
}

#[tokio::test]
async fn unknown_command_is_not_found() {
    let ctx = ApiContext::default();
    let err = dispatch(&ctx, &CommandRequest::new("reboot"))
        .await
        .expect_err("unknown");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("reboot"));
}

#[tokio::test]
async fn missing_argument_is_a_validation_error() {
    let ctx = ApiContext::default();
    let err = dispatch(&ctx, &CommandRequest::new(GREET))
        .await
        .expect_err("missing name");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = dispatch(&ctx, &CommandRequest::new(SAY_BYE).with_arg("name", "Ada"))
        .await
        .expect_err("wrong arg name");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn reinstalling_is_a_conflict_and_blank_names_are_invalid() {
    let ctx = ApiContext::default();
    install_plugin(&ctx, "clock").await.expect("first");

    let err = install_plugin(&ctx, "clock").await.expect_err("second");
    assert_eq!(err.code, ErrorCode::Conflict);

    let err = install_plugin(&ctx, " ").await.expect_err("blank");
    assert_eq!(err.code, ErrorCode::Validation);

    assert_eq!(get_active_plugins(&ctx).await, vec!["clock"]);
}
