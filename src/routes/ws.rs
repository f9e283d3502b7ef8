//! WebSocket upgrade + game session loop.
//!
//! Each connection owns one [`Session`]: at most one engine plus at most one
//! scheduled transition. The loop multiplexes client messages with a periodic
//! driver tick; the tick both broadcasts the countdown and fires due
//! transitions, so a silent client still sees time expire and the game move
//! on.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, error, info, instrument};

use crate::engine::{EngineEvent, GameEngine, Pending, Step};
use crate::protocol::{to_server_message, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

struct Scheduled {
  due: Instant,
  action: Pending,
}

struct Session {
  engine: Option<GameEngine>,
  scheduled: Option<Scheduled>,
}

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "square_detective", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "square_detective", "WebSocket connected");
  let mut session = Session {
    engine: None,
    scheduled: None,
  };
  let mut ticker = interval(Duration::from_millis(state.config.tick_ms.max(10)));

  loop {
    tokio::select! {
      maybe_msg = socket.recv() => {
        let Some(Ok(msg)) = maybe_msg else { break };
        match msg {
          Message::Text(txt) => {
            let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "square_detective", "WS received: {:?}", &incoming);
                handle_client_message(incoming, &mut session, &state).await
              }
              Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
            };
            if send_all(&mut socket, replies).await.is_err() { break; }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      _ = ticker.tick() => {
        let replies = advance_session(&mut session, &state).await;
        if send_all(&mut socket, replies).await.is_err() { break; }
      }
    }
  }
  if let Some(engine) = &session.engine {
    info!(
      target: "game",
      score = engine.score(),
      level = engine.game_level(),
      question = engine.question_index(),
      "Session abandoned mid-game"
    );
  }
  info!(target: "square_detective", "WebSocket disconnected");
}

#[instrument(level = "info", skip(msg, session, state))]
async fn handle_client_message(
  msg: ClientWsMessage,
  session: &mut Session,
  state: &AppState,
) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::StartGame { player_name, difficulty_level } => {
      if session.engine.is_some() {
        return vec![ServerWsMessage::Error { message: "A game is already running.".into() }];
      }
      match GameEngine::new(player_name, difficulty_level) {
        Some(mut engine) => {
          let step = engine.start();
          session.engine = Some(engine);
          collect_step(session, state, step).await
        }
        None => vec![ServerWsMessage::Error { message: "Unknown difficulty level.".into() }],
      }
    }

    ClientWsMessage::StartLevel => {
      let step = match session.engine.as_mut() {
        Some(engine) => match engine.start_game_level() {
          Ok(step) => step,
          Err(e) => {
            error!(target: "game", error = %e, "Question generation failed");
            return vec![ServerWsMessage::Error { message: e.to_string() }];
          }
        },
        None => return vec![no_game()],
      };
      collect_step(session, state, step).await
    }

    ClientWsMessage::Answer { index } => {
      let step = match session.engine.as_mut() {
        Some(engine) => engine.handle_answer(index, false),
        None => return vec![no_game()],
      };
      collect_step(session, state, step).await
    }

    // Repeat or out-of-question hint requests stay silent.
    ClientWsMessage::Hint => match session.engine.as_mut().and_then(|e| e.use_hint()) {
      Some(grant) => vec![ServerWsMessage::Hint {
        penalty: grant.penalty,
        reveal: grant.reveal,
      }],
      None => Vec::new(),
    },

    ClientWsMessage::FinishGame => {
      let step = match session.engine.as_mut() {
        Some(engine) => engine.finish_game(),
        None => return vec![no_game()],
      };
      collect_step(session, state, step).await
    }
  }
}

fn no_game() -> ServerWsMessage {
  ServerWsMessage::Error { message: "No game started.".into() }
}

/// Fire the scheduled transition if its delay has elapsed, then run the
/// countdown tick.
async fn advance_session(session: &mut Session, state: &AppState) -> Vec<ServerWsMessage> {
  let mut out = Vec::new();

  let due_action = match &session.scheduled {
    Some(s) if Instant::now() >= s.due => {
      let action = s.action;
      session.scheduled = None;
      Some(action)
    }
    _ => None,
  };
  if let Some(action) = due_action {
    let step = match session.engine.as_mut() {
      Some(engine) => match engine.resolve(action) {
        Ok(step) => step,
        Err(e) => {
          error!(target: "game", error = %e, "Question generation failed");
          out.push(ServerWsMessage::Error { message: e.to_string() });
          Step::default()
        }
      },
      None => Step::default(),
    };
    out.extend(collect_step(session, state, step).await);
  }

  let step = match session.engine.as_mut() {
    Some(engine) => engine.tick(),
    None => Step::default(),
  };
  out.extend(collect_step(session, state, step).await);
  out
}

/// Turn a step into wire messages, arming its scheduled transition. A game
/// end records the score (attaching the board rank) and retires the engine so
/// the connection can host a fresh game.
async fn collect_step(session: &mut Session, state: &AppState, step: Step) -> Vec<ServerWsMessage> {
  if let Some((delay, action)) = step.scheduled {
    session.scheduled = Some(Scheduled {
      due: Instant::now() + delay,
      action,
    });
  }

  let mut out = Vec::with_capacity(step.events.len());
  let mut game_over = false;
  for event in step.events {
    match event {
      EngineEvent::GameEnd { score, difficulty_level, game_level, player_name } => {
        let rank = state
          .record_score(&player_name, score, difficulty_level, game_level)
          .await;
        game_over = true;
        out.push(ServerWsMessage::GameEnd {
          score,
          difficulty_level,
          game_level,
          player_name,
          rank,
        });
      }
      other => out.push(to_server_message(other)),
    }
  }
  if game_over {
    session.engine = None;
    session.scheduled = None;
  }
  out
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "square_detective", error = %e, "WS send error");
      return Err(e);
    }
  }
  Ok(())
}
