//! The game state machine.
//!
//! One [`GameEngine`] per session drives instruction -> question -> answer ->
//! next-question/level -> finish, owns the countdown deadline, and
//! accumulates the score. The engine is synchronous: every entry point
//! returns a [`Step`] carrying the events to deliver plus at most one
//! deferred transition for the session loop to schedule. The `locked` flag
//! resolves the race between a player answer and the timeout auto-submit:
//! whichever lands first wins, every later call is discarded.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::{QuestionInstance, ScoreBreakdown, TaskMode};
use crate::generator::{generate_unique_set, GenerationExhausted};
use crate::scoring::calculate_score;
use crate::tables::{difficulty_profile, level_definition, DifficultyProfile, LevelDefinition, LEVEL_DEFINITIONS};

/// Sentinel answer index meaning "no selection" (timeout auto-submit).
pub const NO_SELECTION: i64 = -1;

/// Remaining time at or below which the countdown counts as expired. Absorbs
/// tick granularity so the auto-submit fires exactly once.
const EXPIRY_EPSILON: f64 = 0.05;

const RETRY_NOTICE_DELAY: Duration = Duration::from_millis(1000);
const NEXT_QUESTION_DELAY: Duration = Duration::from_millis(800);
const NEXT_LEVEL_DELAY: Duration = Duration::from_millis(1000);

/// Events the engine emits for the presentation side.
#[derive(Clone, Debug)]
pub enum EngineEvent {
  GameStarted {
    player_name: String,
    difficulty_level: u8,
    difficulty_name: &'static str,
    score: i64,
  },
  Instruction {
    game_level: u8,
    name: &'static str,
    description: &'static str,
    task: TaskMode,
    total_questions: u32,
  },
  Board {
    question: QuestionInstance,
    question_index: u32,
    total_questions: u32,
  },
  TimerTick {
    seconds_left: f64,
    budget: u32,
  },
  QuestionResult {
    correct: bool,
    chosen: i64,
    gained: i64,
    scoring: ScoreBreakdown,
    time_left: u32,
    question_index: u32,
    total_questions: u32,
    time_up: bool,
    score: i64,
  },
  WrongAnswer {
    message: &'static str,
  },
  GameEnd {
    score: i64,
    difficulty_level: u8,
    game_level: u8,
    player_name: String,
  },
}

/// Deferred one-shot transitions. At most one is pending per question; the
/// `locked` gate keeps state-changing entry points from re-arming it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
  /// Tell the player the answer was wrong (the question stays current).
  RetryNotice { time_up: bool },
  /// Advance to the next question after a correct answer.
  NextQuestion,
  /// Show the instruction for the level just entered.
  NextInstruction,
}

/// One engine transition: events to deliver plus an optional deferred action.
#[derive(Debug, Default)]
pub struct Step {
  pub events: Vec<EngineEvent>,
  pub scheduled: Option<(Duration, Pending)>,
}

impl Step {
  fn none() -> Self {
    Self::default()
  }

  fn events(events: Vec<EngineEvent>) -> Self {
    Self {
      events,
      scheduled: None,
    }
  }
}

/// A granted hint: the penalty that will be deducted from a correct answer,
/// plus wrong squares the client may grey out.
#[derive(Clone, Debug)]
pub struct HintGrant {
  pub penalty: i64,
  pub reveal: Vec<usize>,
}

/// Explicit session state. No ambient/static game state exists: several
/// concurrent games are simply several engines.
pub struct GameEngine {
  player_name: String,
  difficulty: &'static DifficultyProfile,
  game_level: u8,
  question_index: u32,
  score: i64,
  locked: bool,
  hint_used: bool,
  showing_instruction: bool,
  ended: bool,
  current: Option<QuestionInstance>,
  deadline: Option<Instant>,
  budget: u32,
}

/// Time budget for a question: exponential decay from the difficulty's base
/// time, floored at 8 seconds. `max(8, floor(base_time * 0.9^(index-1)))`.
pub fn time_for_question(base_time: u32, question_index: u32) -> u32 {
  let decay = 0.9_f64.powi(question_index.saturating_sub(1) as i32);
  let decayed = (f64::from(base_time) * decay).floor() as u32;
  decayed.max(8)
}

impl GameEngine {
  /// Create an engine for one session. Unknown difficulty levels are refused.
  pub fn new(player_name: String, difficulty_level: u8) -> Option<Self> {
    let difficulty = difficulty_profile(difficulty_level)?;
    Some(Self {
      player_name,
      difficulty,
      game_level: 1,
      question_index: 1,
      score: 0,
      locked: false,
      hint_used: false,
      showing_instruction: false,
      ended: false,
      current: None,
      deadline: None,
      budget: 0,
    })
  }

  pub fn score(&self) -> i64 {
    self.score
  }

  pub fn game_level(&self) -> u8 {
    self.game_level
  }

  pub fn question_index(&self) -> u32 {
    self.question_index
  }

  #[allow(dead_code)]
  pub fn current(&self) -> Option<&QuestionInstance> {
    self.current.as_ref()
  }

  fn level(&self) -> &'static LevelDefinition {
    // game_level stays within 1..=3 by construction
    level_definition(self.game_level).unwrap_or(&LEVEL_DEFINITIONS[0])
  }

  /// Enter the session: greet and show the first level's instruction.
  pub fn start(&mut self) -> Step {
    info!(
      target: "game",
      player = %self.player_name,
      difficulty = self.difficulty.level,
      "session started"
    );
    let started = EngineEvent::GameStarted {
      player_name: self.player_name.clone(),
      difficulty_level: self.difficulty.level,
      difficulty_name: self.difficulty.name,
      score: self.score,
    };
    let instruction = self.instruction_event();
    Step::events(vec![started, instruction])
  }

  fn instruction_event(&mut self) -> EngineEvent {
    self.showing_instruction = true;
    let level = self.level();
    EngineEvent::Instruction {
      game_level: self.game_level,
      name: level.name,
      description: level.description,
      task: level.task,
      total_questions: level.questions,
    }
  }

  /// Leave the instruction screen and begin the level's first question.
  pub fn start_game_level(&mut self) -> Result<Step, GenerationExhausted> {
    if self.ended || !self.showing_instruction {
      return Ok(Step::none());
    }
    self.showing_instruction = false;
    self.question_index = 1;
    self.ask_question()
  }

  fn ask_question(&mut self) -> Result<Step, GenerationExhausted> {
    let level = self.level();
    if self.question_index > level.questions {
      return Ok(self.finish_game_level());
    }

    self.hint_used = false;
    self.locked = false;

    let size = {
      let mut rng = rand::thread_rng();
      *self.difficulty.sizes.choose(&mut rng).unwrap_or(&3)
    };
    let slot = (self.question_index - 1) as usize;
    let total_squares = level.progression[slot];
    let modifier = level.modifiers[slot];
    let time_budget = time_for_question(self.difficulty.base_time, self.question_index);

    let set = generate_unique_set(total_squares, size, self.difficulty.colors)?;
    let question = QuestionInstance {
      patterns: set.patterns,
      correct_index: set.correct_index,
      target: set.target,
      size,
      colors: self.difficulty.colors,
      modifier,
      task: level.task,
      total_squares,
      time_budget,
    };
    debug!(
      target: "game",
      level = self.game_level,
      question = self.question_index,
      size,
      ?modifier,
      time_budget,
      "question ready"
    );

    self.current = Some(question.clone());
    self.budget = time_budget;
    // Arming the deadline replaces any previous countdown.
    self.deadline = Some(Instant::now() + Duration::from_secs(u64::from(time_budget)));

    Ok(Step::events(vec![EngineEvent::Board {
      question,
      question_index: self.question_index,
      total_questions: level.questions,
    }]))
  }

  /// Remaining seconds on the active countdown, clamped to zero.
  pub fn time_left(&self) -> f64 {
    match self.deadline {
      Some(deadline) => {
        let now = Instant::now();
        if now >= deadline {
          0.0
        } else {
          (deadline - now).as_secs_f64()
        }
      }
      None => 0.0,
    }
  }

  fn time_left_secs(&self) -> u32 {
    self.time_left().ceil().max(0.0) as u32
  }

  /// Periodic driver tick. Emits the countdown state and auto-submits the
  /// time-up answer once the budget runs out.
  pub fn tick(&mut self) -> Step {
    if self.ended || self.locked || self.current.is_none() || self.deadline.is_none() {
      return Step::none();
    }
    let seconds_left = self.time_left();
    if seconds_left <= EXPIRY_EPSILON {
      return self.handle_answer(NO_SELECTION, true);
    }
    Step::events(vec![EngineEvent::TimerTick {
      seconds_left,
      budget: self.budget,
    }])
  }

  /// Grant a hint at most once per question. Returns the penalty that a
  /// correct answer will pay plus wrong squares to grey out; repeat requests
  /// or requests with no active question are silently ignored.
  pub fn use_hint(&mut self) -> Option<HintGrant> {
    if self.hint_used {
      return None;
    }
    let (correct_index, total_squares, modifier, pattern_count) = match self.current.as_ref() {
      Some(q) => (q.correct_index, q.total_squares, q.modifier, q.patterns.len()),
      None => return None,
    };
    self.hint_used = true;

    let scoring = calculate_score(
      self.difficulty,
      self.game_level,
      self.question_index,
      total_squares,
      self.time_left_secs(),
      modifier,
    );
    let penalty = scoring.base / 10;

    let mut wrong: Vec<usize> = (0..pattern_count).filter(|&i| i != correct_index).collect();
    let mut rng = rand::thread_rng();
    wrong.shuffle(&mut rng);
    wrong.truncate((wrong.len() / 3).max(1));

    debug!(target: "game", penalty, revealed = wrong.len(), "hint used");
    Some(HintGrant {
      penalty,
      reveal: wrong,
    })
  }

  /// Resolve an answer. Guarded by `locked`: the first of {player answer,
  /// timeout auto-submit} wins, and every later call is a no-op. An index
  /// matching no rendered pattern (the -1 sentinel included) is simply
  /// incorrect, never an error.
  pub fn handle_answer(&mut self, chosen: i64, time_up: bool) -> Step {
    if self.locked || self.ended {
      return Step::none();
    }
    let (correct_index, total_squares, modifier) = match self.current.as_ref() {
      Some(q) => (q.correct_index, q.total_squares, q.modifier),
      None => return Step::none(),
    };

    self.locked = true;
    let time_left = self.time_left_secs();
    self.deadline = None;

    let correct = chosen >= 0 && chosen as usize == correct_index;
    let scoring = calculate_score(
      self.difficulty,
      self.game_level,
      self.question_index,
      total_squares,
      time_left,
      modifier,
    );

    let mut gained = 0;
    if correct {
      gained = scoring.total;
      if self.hint_used {
        // Same inputs as at hint time, so the recomputed base matches the
        // advertised penalty.
        gained -= scoring.base / 10;
      }
      self.score += gained;
    }

    info!(
      target: "game",
      level = self.game_level,
      question = self.question_index,
      correct,
      time_up,
      gained,
      score = self.score,
      "answer resolved"
    );

    let events = vec![EngineEvent::QuestionResult {
      correct,
      chosen,
      gained,
      scoring,
      time_left,
      question_index: self.question_index,
      total_questions: self.level().questions,
      time_up,
      score: self.score,
    }];

    let scheduled = if correct {
      Some((NEXT_QUESTION_DELAY, Pending::NextQuestion))
    } else {
      Some((RETRY_NOTICE_DELAY, Pending::RetryNotice { time_up }))
    };

    Step { events, scheduled }
  }

  /// Execute a deferred transition once its delay has elapsed.
  pub fn resolve(&mut self, pending: Pending) -> Result<Step, GenerationExhausted> {
    if self.ended {
      return Ok(Step::none());
    }
    match pending {
      Pending::RetryNotice { time_up } => {
        let message = if time_up {
          "Time is up. Try again"
        } else {
          "Wrong answer. Try again"
        };
        Ok(Step::events(vec![EngineEvent::WrongAnswer { message }]))
      }
      Pending::NextQuestion => self.next_question(),
      Pending::NextInstruction => {
        let instruction = self.instruction_event();
        Ok(Step::events(vec![instruction]))
      }
    }
  }

  fn next_question(&mut self) -> Result<Step, GenerationExhausted> {
    self.question_index += 1;
    self.ask_question()
  }

  /// Level completion. Below level 3 the advance is unconditional; level 3
  /// completion ends the game.
  fn finish_game_level(&mut self) -> Step {
    self.deadline = None;
    if self.game_level < 3 {
      self.game_level += 1;
      info!(target: "game", level = self.game_level, "level complete, advancing");
      Step {
        events: Vec::new(),
        scheduled: Some((NEXT_LEVEL_DELAY, Pending::NextInstruction)),
      }
    } else {
      self.finish_game()
    }
  }

  /// End the game and emit the final summary. Idempotent.
  pub fn finish_game(&mut self) -> Step {
    if self.ended {
      return Step::none();
    }
    self.ended = true;
    self.deadline = None;
    self.current = None;
    info!(target: "game", score = self.score, level = self.game_level, "game finished");
    Step::events(vec![EngineEvent::GameEnd {
      score: self.score,
      difficulty_level: self.difficulty.level,
      game_level: self.game_level,
      player_name: self.player_name.clone(),
    }])
  }

  #[cfg(test)]
  fn expire_countdown(&mut self) {
    self.deadline = Instant::now().checked_sub(Duration::from_secs(1));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn engine() -> GameEngine {
    GameEngine::new("tester".into(), 1).expect("difficulty 1 exists")
  }

  fn open_first_board(e: &mut GameEngine) {
    e.start();
    let step = e.start_game_level().expect("generation");
    assert!(matches!(step.events.first(), Some(EngineEvent::Board { .. })));
  }

  fn correct_index(e: &GameEngine) -> i64 {
    e.current().expect("active question").correct_index as i64
  }

  /// Answer all 6 questions of the current level correctly, resolving each
  /// scheduled advance; returns the step produced by the final advance.
  fn clear_level(e: &mut GameEngine) -> Step {
    let mut step = Step::none();
    for _ in 0..6 {
      let chosen = correct_index(e);
      let answered = e.handle_answer(chosen, false);
      let (_, pending) = answered.scheduled.expect("advance scheduled");
      assert_eq!(pending, Pending::NextQuestion);
      step = e.resolve(pending).expect("resolve");
    }
    step
  }

  #[test]
  fn unknown_difficulty_is_refused() {
    assert!(GameEngine::new("x".into(), 0).is_none());
    assert!(GameEngine::new("x".into(), 9).is_none());
  }

  #[test]
  fn start_greets_and_shows_level_1_instruction() {
    let mut e = engine();
    let step = e.start();
    assert_eq!(step.events.len(), 2);
    assert!(matches!(
      step.events[0],
      EngineEvent::GameStarted { score: 0, difficulty_level: 1, .. }
    ));
    assert!(matches!(
      step.events[1],
      EngineEvent::Instruction { game_level: 1, total_questions: 6, .. }
    ));
  }

  #[test]
  fn start_level_is_a_noop_outside_the_instruction_screen() {
    let mut e = engine();
    // No instruction shown yet.
    let step = e.start_game_level().expect("ok");
    assert!(step.events.is_empty());
  }

  #[test]
  fn first_question_gets_the_full_base_time() {
    let mut e = engine();
    open_first_board(&mut e);
    let q = e.current().expect("question");
    assert_eq!(q.time_budget, 30);
    assert_eq!(q.total_squares, 8);
    assert_eq!(e.question_index(), 1);
  }

  #[test]
  fn time_decays_per_question_with_a_floor() {
    assert_eq!(time_for_question(30, 1), 30);
    assert_eq!(time_for_question(30, 2), 27);
    // 30 * 0.81 = 24.3 -> 24
    assert_eq!(time_for_question(30, 3), 24);
    assert_eq!(time_for_question(30, 20), 8);
  }

  #[test]
  fn correct_answer_accumulates_score_and_locks() {
    let mut e = engine();
    open_first_board(&mut e);
    let chosen = correct_index(&e);

    let step = e.handle_answer(chosen, false);
    match &step.events[0] {
      EngineEvent::QuestionResult { correct, gained, scoring, time_up, .. } => {
        assert!(*correct);
        assert!(!*time_up);
        assert_eq!(*gained, scoring.total);
      }
      other => panic!("expected a question result, got {other:?}"),
    }
    assert_eq!(step.scheduled.map(|(_, p)| p), Some(Pending::NextQuestion));
    assert!(e.score() > 0);

    // Locked: the second submission has no effect.
    let score_before = e.score();
    let again = e.handle_answer(chosen, false);
    assert!(again.events.is_empty());
    assert!(again.scheduled.is_none());
    assert_eq!(e.score(), score_before);
  }

  #[test]
  fn wrong_answer_gains_nothing_and_keeps_the_question() {
    let mut e = engine();
    open_first_board(&mut e);
    let wrong = (correct_index(&e) + 1) % e.current().expect("question").patterns.len() as i64;

    let step = e.handle_answer(wrong, false);
    match &step.events[0] {
      EngineEvent::QuestionResult { correct, gained, .. } => {
        assert!(!*correct);
        assert_eq!(*gained, 0);
      }
      other => panic!("expected a question result, got {other:?}"),
    }
    assert_eq!(e.score(), 0);
    assert_eq!(e.question_index(), 1);
    assert!(e.current().is_some());

    let (_, pending) = step.scheduled.expect("retry notice scheduled");
    assert_eq!(pending, Pending::RetryNotice { time_up: false });
    let notice = e.resolve(pending).expect("resolve");
    assert!(matches!(notice.events[0], EngineEvent::WrongAnswer { .. }));
  }

  #[test]
  fn out_of_range_answers_are_just_incorrect() {
    let mut e = engine();
    open_first_board(&mut e);
    let step = e.handle_answer(999, false);
    match &step.events[0] {
      EngineEvent::QuestionResult { correct, .. } => assert!(!*correct),
      other => panic!("expected a question result, got {other:?}"),
    }
  }

  #[test]
  fn hint_penalty_is_applied_exactly_once() {
    let mut e = engine();
    open_first_board(&mut e);
    let q = e.current().expect("question");
    let correct_idx = q.correct_index;

    let grant = e.use_hint().expect("first hint granted");
    assert!(grant.penalty > 0);
    assert!(!grant.reveal.is_empty());
    assert!(grant.reveal.iter().all(|&i| i != correct_idx));

    // A second request is silently ignored.
    assert!(e.use_hint().is_none());

    let step = e.handle_answer(correct_idx as i64, false);
    match &step.events[0] {
      EngineEvent::QuestionResult { gained, scoring, .. } => {
        assert_eq!(*gained, scoring.total - scoring.base / 10);
        assert_eq!(grant.penalty, scoring.base / 10);
      }
      other => panic!("expected a question result, got {other:?}"),
    }
  }

  #[test]
  fn hint_without_an_active_question_is_ignored() {
    let mut e = engine();
    e.start();
    assert!(e.use_hint().is_none());
  }

  #[test]
  fn tick_reports_the_countdown() {
    let mut e = engine();
    open_first_board(&mut e);
    let step = e.tick();
    match &step.events[0] {
      EngineEvent::TimerTick { seconds_left, budget } => {
        assert_eq!(*budget, 30);
        assert!(*seconds_left > 0.0 && *seconds_left <= 30.0);
      }
      other => panic!("expected a timer tick, got {other:?}"),
    }
  }

  #[test]
  fn expired_countdown_auto_submits_exactly_once() {
    let mut e = engine();
    open_first_board(&mut e);
    e.expire_countdown();

    let step = e.tick();
    match &step.events[0] {
      EngineEvent::QuestionResult { correct, time_up, chosen, time_left, .. } => {
        assert!(!*correct);
        assert!(*time_up);
        assert_eq!(*chosen, NO_SELECTION);
        assert_eq!(*time_left, 0);
      }
      other => panic!("expected a question result, got {other:?}"),
    }
    assert_eq!(
      step.scheduled.map(|(_, p)| p),
      Some(Pending::RetryNotice { time_up: true })
    );

    // The lock swallows all later ticks.
    let again = e.tick();
    assert!(again.events.is_empty());
  }

  #[test]
  fn finishing_question_6_advances_to_the_next_level() {
    let mut e = engine();
    open_first_board(&mut e);

    let step = clear_level(&mut e);
    assert_eq!(e.game_level(), 2);
    let (_, pending) = step.scheduled.expect("instruction scheduled");
    assert_eq!(pending, Pending::NextInstruction);

    let shown = e.resolve(pending).expect("resolve");
    assert!(matches!(
      shown.events[0],
      EngineEvent::Instruction { game_level: 2, .. }
    ));

    e.start_game_level().expect("generation");
    assert_eq!(e.question_index(), 1);
  }

  #[test]
  fn completing_level_3_ends_the_game() {
    let mut e = engine();
    open_first_board(&mut e);

    for _ in 0..2 {
      let step = clear_level(&mut e);
      let (_, pending) = step.scheduled.expect("instruction scheduled");
      e.resolve(pending).expect("resolve");
      e.start_game_level().expect("generation");
    }
    assert_eq!(e.game_level(), 3);

    let step = clear_level(&mut e);
    match step.events.last() {
      Some(EngineEvent::GameEnd { score, game_level, .. }) => {
        assert_eq!(*game_level, 3);
        assert_eq!(*score, e.score());
      }
      other => panic!("expected the game to end, got {other:?}"),
    }

    // Already ended: everything becomes a no-op.
    assert!(e.finish_game().events.is_empty());
    assert!(e.tick().events.is_empty());
    assert!(e.handle_answer(0, false).events.is_empty());
  }

  #[test]
  fn finish_game_emits_the_summary_once() {
    let mut e = engine();
    e.start();
    let step = e.finish_game();
    assert!(matches!(
      step.events[0],
      EngineEvent::GameEnd { score: 0, difficulty_level: 1, .. }
    ));
    assert!(e.finish_game().events.is_empty());
  }
}
