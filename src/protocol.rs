//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Boards go out with palette indices already resolved to hex colors, and
//! carry the correct index so task modes with client-side feedback (deleting
//! the matching square fails instantly) can react without a round trip.

use serde::{Deserialize, Serialize};

use crate::domain::{Modifier, ScoreBreakdown, TaskMode};
use crate::engine::EngineEvent;
use crate::highscores::ScoreEntry;
use crate::pattern::Pattern;
use crate::tables;
use crate::util::format_time;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartGame {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "difficultyLevel")]
        difficulty_level: u8,
    },
    /// Leave the instruction screen and begin the level.
    StartLevel,
    Answer {
        index: i64,
    },
    Hint,
    FinishGame,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    GameStarted {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "difficultyLevel")]
        difficulty_level: u8,
        #[serde(rename = "difficultyName")]
        difficulty_name: String,
        score: i64,
    },
    Instruction {
        #[serde(rename = "gameLevel")]
        game_level: u8,
        name: String,
        description: String,
        task: TaskMode,
        #[serde(rename = "totalQuestions")]
        total_questions: u32,
    },
    Board {
        board: BoardOut,
    },
    TimerTick {
        #[serde(rename = "secondsLeft")]
        seconds_left: f64,
        display: String,
        budget: u32,
    },
    QuestionResult {
        correct: bool,
        chosen: i64,
        gained: i64,
        scoring: ScoreBreakdown,
        #[serde(rename = "timeLeft")]
        time_left: u32,
        #[serde(rename = "questionIndex")]
        question_index: u32,
        #[serde(rename = "totalQuestions")]
        total_questions: u32,
        #[serde(rename = "timeUp")]
        time_up: bool,
        score: i64,
    },
    WrongAnswer {
        message: String,
    },
    Hint {
        penalty: i64,
        /// Indices of wrong squares the client may grey out.
        reveal: Vec<usize>,
    },
    GameEnd {
        score: i64,
        #[serde(rename = "difficultyLevel")]
        difficulty_level: u8,
        #[serde(rename = "gameLevel")]
        game_level: u8,
        #[serde(rename = "playerName")]
        player_name: String,
        /// 1-based position on the score board, if the score made it.
        rank: Option<usize>,
    },
    Error {
        message: String,
    },
}

/// One rendered question: candidate squares plus the sample to match.
#[derive(Debug, Serialize)]
pub struct BoardOut {
    /// Per square: rows of resolved hex colors.
    pub squares: Vec<Vec<Vec<String>>>,
    #[serde(rename = "correctIndex")]
    pub correct_index: usize,
    pub target: Vec<Vec<String>>,
    pub size: usize,
    pub colors: u8,
    pub modifier: Modifier,
    pub task: TaskMode,
    /// Time budget for this question in seconds.
    pub time: u32,
    #[serde(rename = "questionIndex")]
    pub question_index: u32,
    #[serde(rename = "totalQuestions")]
    pub total_questions: u32,
}

fn resolve_colors(pattern: &Pattern, colors: u8) -> Vec<Vec<String>> {
    let palette = tables::palette(colors);
    pattern
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|&cell| palette[usize::from(cell) % palette.len()].to_string())
                .collect()
        })
        .collect()
}

/// Translate an engine event into its wire form. The game-end rank is filled
/// in by the session loop after the score is recorded.
pub fn to_server_message(event: EngineEvent) -> ServerWsMessage {
    match event {
        EngineEvent::GameStarted {
            player_name,
            difficulty_level,
            difficulty_name,
            score,
        } => ServerWsMessage::GameStarted {
            player_name,
            difficulty_level,
            difficulty_name: difficulty_name.to_string(),
            score,
        },
        EngineEvent::Instruction {
            game_level,
            name,
            description,
            task,
            total_questions,
        } => ServerWsMessage::Instruction {
            game_level,
            name: name.to_string(),
            description: description.to_string(),
            task,
            total_questions,
        },
        EngineEvent::Board {
            question,
            question_index,
            total_questions,
        } => {
            let squares = question
                .patterns
                .iter()
                .map(|p| resolve_colors(p, question.colors))
                .collect();
            ServerWsMessage::Board {
                board: BoardOut {
                    squares,
                    correct_index: question.correct_index,
                    target: resolve_colors(&question.target, question.colors),
                    size: question.size,
                    colors: question.colors,
                    modifier: question.modifier,
                    task: question.task,
                    time: question.time_budget,
                    question_index,
                    total_questions,
                },
            }
        }
        EngineEvent::TimerTick { seconds_left, budget } => ServerWsMessage::TimerTick {
            seconds_left,
            display: format_time(seconds_left),
            budget,
        },
        EngineEvent::QuestionResult {
            correct,
            chosen,
            gained,
            scoring,
            time_left,
            question_index,
            total_questions,
            time_up,
            score,
        } => ServerWsMessage::QuestionResult {
            correct,
            chosen,
            gained,
            scoring,
            time_left,
            question_index,
            total_questions,
            time_up,
            score,
        },
        EngineEvent::WrongAnswer { message } => ServerWsMessage::WrongAnswer {
            message: message.to_string(),
        },
        EngineEvent::GameEnd {
            score,
            difficulty_level,
            game_level,
            player_name,
        } => ServerWsMessage::GameEnd {
            score,
            difficulty_level,
            game_level,
            player_name,
            rank: None,
        },
    }
}

// ---- HTTP DTOs ----

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ScoresOut {
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearScoresOut {
    pub cleared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"start_game","playerName":"ada","difficultyLevel":2}"#)
                .expect("parse");
        match msg {
            ClientWsMessage::StartGame { player_name, difficulty_level } => {
                assert_eq!(player_name, "ada");
                assert_eq!(difficulty_level, 2);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"answer","index":-1}"#).expect("parse");
        assert!(matches!(msg, ClientWsMessage::Answer { index: -1 }));
    }

    #[test]
    fn boards_resolve_palette_indices_to_hex() {
        let p = Pattern::from_cells(vec![vec![0, 1], vec![1, 0]]);
        let resolved = resolve_colors(&p, 2);
        assert_eq!(resolved[0][0], "#af11e9ff");
        assert_eq!(resolved[0][1], "#fa9cedff");
        assert_eq!(resolved[1][0], "#fa9cedff");
    }

    #[test]
    fn board_wire_form_matches_the_client_contract() {
        let question = crate::domain::QuestionInstance {
            patterns: vec![Pattern::from_cells(vec![vec![0]]), Pattern::from_cells(vec![vec![1]])],
            correct_index: 1,
            target: Pattern::from_cells(vec![vec![1]]),
            size: 1,
            colors: 2,
            modifier: Modifier::None,
            task: TaskMode::Click,
            total_squares: 2,
            time_budget: 30,
        };
        let msg = to_server_message(EngineEvent::Board {
            question,
            question_index: 1,
            total_questions: 6,
        });
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(json.contains(r#""type":"board""#));
        assert!(json.contains(r#""correctIndex":1"#));
        assert!(json.contains(r#""task":"click""#));
        assert!(json.contains(r#""modifier":"none""#));
    }

    #[test]
    fn timer_tick_includes_a_display_string() {
        let msg = to_server_message(EngineEvent::TimerTick {
            seconds_left: 64.2,
            budget: 30,
        });
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(json.contains(r#""display":"01:05""#));
        assert!(json.contains(r#""secondsLeft":64.2"#));
    }
}
