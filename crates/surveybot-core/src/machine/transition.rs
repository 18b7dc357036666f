use std::time::{Duration, Instant};

use surveybot_types::answer::{Rating, Sex};
use surveybot_types::error::SessionError;
use surveybot_types::event::Choice;
use surveybot_types::identity::ParticipantId;
use surveybot_types::session::{Session, Stage};

use super::effect::{Effect, Input, Next, Step};
use crate::prompts;
use crate::survey::Survey;

/// Read-only inputs every transition needs.
#[derive(Debug, Clone, Copy)]
pub struct MachineContext<'a> {
    pub survey: &'a Survey,
    pub ttl: Duration,
}

/// Compute the next state and effects for `input`.
///
/// `current` is the stored session for `identity`, if one exists.
pub fn transition(
    ctx: &MachineContext<'_>,
    identity: ParticipantId,
    current: Option<&Session>,
    input: Input<'_>,
    now: Instant,
) -> Step {
    if let Input::Start = input {
        return Step::advance(
            Session::new(identity, now),
            vec![Effect::Send(prompts::age_prompt())],
        );
    }

    let Some(session) = current else {
        return Step::expire(Next::Keep, SessionError::NotFound);
    };
    if session.is_expired(now, ctx.ttl) {
        return Step::expire(Next::Remove, SessionError::Expired);
    }

    match (session.stage, input) {
        (Stage::AwaitingAge, Input::Text(text)) => match parse_age(text) {
            Some(age) => accept_age(session, age),
            None => Step::reject(
                SessionError::InvalidInput(format!("age '{text}'")),
                prompts::age_reprompt(),
            ),
        },
        (Stage::AwaitingAge, _) => Step::reject(
            SessionError::InvalidInput("expected age".to_string()),
            prompts::age_reprompt(),
        ),

        (Stage::AwaitingSex, Input::Choice(Choice::Sex(sex))) => accept_sex(ctx, session, sex),
        (Stage::AwaitingSex, _) => Step::reject(
            SessionError::InvalidInput("expected sex choice".to_string()),
            prompts::sex_prompt(),
        ),

        (Stage::AskingQuestion(index), Input::Choice(Choice::Rating(rating))) => {
            accept_rating(ctx, session, index, rating, now)
        }
        (Stage::AskingQuestion(index), _) => match ctx.survey.prompt(index) {
            Some(prompt) => Step::reject(
                SessionError::InvalidInput("expected rating".to_string()),
                prompt,
            ),
            // A stage past the end cannot be reached through `accept_rating`.
            None => Step::expire(Next::Remove, SessionError::NotFound),
        },
    }
}

/// ASCII digits only, surrounding whitespace ignored.
fn parse_age(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

fn accept_age(session: &Session, age: u32) -> Step {
    let mut next = session.clone();
    next.age = Some(age);
    next.stage = Stage::AwaitingSex;
    Step::advance(next, vec![Effect::Send(prompts::sex_prompt())])
}

fn accept_sex(ctx: &MachineContext<'_>, session: &Session, sex: Sex) -> Step {
    let mut next = session.clone();
    next.sex = Some(sex);
    next.stage = Stage::AskingQuestion(0);

    let mut effects = vec![Effect::Send(prompts::test_intro())];
    effects.extend(ctx.survey.prompt(0).map(Effect::Send));
    Step::advance(next, effects)
}

fn accept_rating(
    ctx: &MachineContext<'_>,
    session: &Session,
    index: usize,
    rating: Rating,
    now: Instant,
) -> Step {
    let mut next = session.clone();
    next.answers.push(rating);

    let following = index + 1;
    if following < ctx.survey.len() {
        next.stage = Stage::AskingQuestion(following);
        let effects = ctx.survey.prompt(following).map(Effect::Send).into_iter().collect();
        return Step::advance(next, effects);
    }

    Step {
        next: Next::Remove,
        effects: vec![
            Effect::Persist(next.to_record(now)),
            Effect::Send(prompts::thank_you()),
        ],
        rejected: None,
    }
}
