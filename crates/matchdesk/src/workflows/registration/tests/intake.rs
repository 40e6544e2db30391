use super::common::*;
use crate::workflows::registration::intake::{
    ConversationId, IntakeError, IntakeProgress, IntakeSessionStore, IntakeStep, NextPrompt,
};

fn conversation(id: &str) -> ConversationId {
    ConversationId(id.to_string())
}

#[test]
fn singles_flow_walks_every_prompt_in_order() {
    let store = IntakeSessionStore::new(registry());
    let chat = conversation("chat-1");

    assert_eq!(store.start(&chat), NextPrompt::Category);
    assert_eq!(
        store.answer(&chat, "Ladies Amateur"),
        Ok(IntakeProgress::Prompt(NextPrompt::Name))
    );
    assert_eq!(
        store.answer(&chat, "Anna Petrova"),
        Ok(IntakeProgress::Prompt(NextPrompt::Phone))
    );
    assert_eq!(
        store.answer(&chat, "+7 900 123-45-67"),
        Ok(IntakeProgress::Prompt(NextPrompt::Handle))
    );

    let progress = store.answer(&chat, "@anna").expect("handle accepted");
    let IntakeProgress::Complete(record) = progress else {
        panic!("expected a completed intake, got {progress:?}");
    };
    assert_eq!(record.category, "Ladies Amateur");
    assert_eq!(record.player_name, "Anna Petrova");
    assert_eq!(record.partner_name, None);
    assert_eq!(record.phone, "+7 900 123-45-67");
    assert_eq!(record.handle, "@anna");

    // Completed sessions are retired.
    assert_eq!(store.active_sessions(), 0);
}

#[test]
fn pair_categories_insert_the_partner_prompt() {
    let store = IntakeSessionStore::new(registry());
    let chat = conversation("chat-2");

    store.start(&chat);
    store.answer(&chat, "Mixed Amateur").expect("category");
    assert_eq!(
        store.answer(&chat, "Anna Petrova"),
        Ok(IntakeProgress::Prompt(NextPrompt::Partner))
    );
    store.answer(&chat, "Igor Petrov").expect("partner");
    store.answer(&chat, "+7 900 123-45-67").expect("phone");

    let progress = store.answer(&chat, "@pair").expect("handle accepted");
    let IntakeProgress::Complete(record) = progress else {
        panic!("expected a completed intake, got {progress:?}");
    };
    assert_eq!(record.partner_name.as_deref(), Some("Igor Petrov"));
}

#[test]
fn unknown_category_text_keeps_the_session_on_the_category_step() {
    let store = IntakeSessionStore::new(registry());
    let chat = conversation("chat-3");

    store.start(&chat);
    let outcome = store.answer(&chat, "Seniors Open");
    assert!(matches!(outcome, Err(IntakeError::UnknownCategory(_))));
    assert_eq!(store.step_of(&chat), Some(IntakeStep::AwaitingCategory));

    // A valid answer still advances afterwards.
    assert_eq!(
        store.answer(&chat, "Ladies Amateur"),
        Ok(IntakeProgress::Prompt(NextPrompt::Name))
    );
}

#[test]
fn blank_partner_answers_keep_the_session_on_the_partner_step() {
    let store = IntakeSessionStore::new(registry());
    let chat = conversation("chat-4");

    store.start(&chat);
    store.answer(&chat, "Mixed Amateur").expect("category");
    store.answer(&chat, "Anna Petrova").expect("name");

    let outcome = store.answer(&chat, "   ");
    assert_eq!(outcome, Err(IntakeError::MissingPartner));
    assert_eq!(store.step_of(&chat), Some(IntakeStep::AwaitingPartner));
}

#[test]
fn a_new_start_resets_the_session_and_discards_answers() {
    let store = IntakeSessionStore::new(registry());
    let chat = conversation("chat-5");

    store.start(&chat);
    store.answer(&chat, "Mixed Amateur").expect("category");
    store.answer(&chat, "Anna Petrova").expect("name");
    assert_eq!(store.step_of(&chat), Some(IntakeStep::AwaitingPartner));

    assert_eq!(store.start(&chat), NextPrompt::Category);
    assert_eq!(store.step_of(&chat), Some(IntakeStep::AwaitingCategory));

    // The restarted session runs a fresh intake.
    store.answer(&chat, "Ladies Amateur").expect("category");
    store.answer(&chat, "Vera Sokolova").expect("name");
    store.answer(&chat, "+7 900 000-00-00").expect("phone");
    let progress = store.answer(&chat, "@vera").expect("handle accepted");
    let IntakeProgress::Complete(record) = progress else {
        panic!("expected a completed intake, got {progress:?}");
    };
    assert_eq!(record.category, "Ladies Amateur");
    assert_eq!(record.player_name, "Vera Sokolova");
}

#[test]
fn free_text_without_a_session_is_rejected() {
    let store = IntakeSessionStore::new(registry());
    let outcome = store.answer(&conversation("chat-6"), "Ladies Amateur");
    assert_eq!(outcome, Err(IntakeError::NoActiveSession));
}

#[test]
fn conversations_do_not_share_session_state() {
    let store = IntakeSessionStore::new(registry());
    let left = conversation("chat-7");
    let right = conversation("chat-8");

    store.start(&left);
    store.start(&right);
    store.answer(&left, "Ladies Amateur").expect("category");

    assert_eq!(store.step_of(&left), Some(IntakeStep::AwaitingName));
    assert_eq!(store.step_of(&right), Some(IntakeStep::AwaitingCategory));
    assert_eq!(store.active_sessions(), 2);
}
