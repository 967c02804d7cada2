//! Game lifecycle: start, the authoritative turn protocol, AI driving,
//! and rematch voting.

use super::{EventBatch, Hub, game_broadcast, room_broadcast};
use crate::ai::{MoveSelector, SERVER_AI_DIFFICULTY};
use crate::errors::{ServerError, ServerResult};
use crate::events::{
    GameStartedPayload, RematchCancelReason, ServerEvent, TurnMadePayload,
};
use crate::game::board::{Board, Chip, TeamColor};
use crate::game::deck;
use crate::game::detector::{self, SEQUENCES_TO_WIN};
use crate::store::entities::{
    Game, GameId, GamePlayer, GamePlayerView, GameStatus, GameTeam, PlayerId, RematchState,
    RematchStateView, Room, RoomId, RoomPlayer, RoomStatus, Turn,
};
use crate::store::registry::Registry;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameOutcome {
    pub game_id: GameId,
    #[serde(rename = "missingPlayersFilledWithAI")]
    pub missing_players_filled_with_ai: bool,
    pub ai_count: usize,
}

/// Handle for a scheduled AI turn. The history length pins the exact
/// game state the timer was armed against; any mismatch when it fires
/// makes it a no-op.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AiTurnRef {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub history_len: usize,
}

#[derive(Debug)]
pub(crate) struct TurnOutcome {
    pub events: EventBatch,
    pub next_ai: Option<AiTurnRef>,
}

fn color_for_team(team: u8) -> TeamColor {
    if team == 1 { TeamColor::Green } else { TeamColor::Blue }
}

/// Build a fresh game from the room roster: seat order is the room's
/// player order, team 1 plays green, team 2 blue, and each seat is dealt
/// `hand_size` consecutive cards from cursor 0.
fn build_game_from_room(room: &Room, seed: u32) -> Game {
    let shuffled = deck::shuffled_deck(seed);
    let per_hand = deck::hand_size(room.players.len());
    let mut cursor = 0;

    let players: Vec<GamePlayer> = room
        .players
        .iter()
        .map(|p| {
            let hand = shuffled[cursor..cursor + per_hand].to_vec();
            cursor += per_hand;
            GamePlayer {
                player_id: p.player_id,
                display_name: p.display_name.clone(),
                team_color: color_for_team(p.team),
                is_ai: p.is_ai,
                hand,
            }
        })
        .collect();

    let teams = [1u8, 2]
        .into_iter()
        .map(|team| GameTeam {
            team,
            color: color_for_team(team),
            player_ids: room
                .players
                .iter()
                .filter(|p| p.team == team)
                .map(|p| p.player_id)
                .collect(),
        })
        .collect();

    let first_player = players
        .first()
        .map(|p| p.player_id)
        .unwrap_or_else(Uuid::new_v4);

    Game {
        id: Uuid::new_v4(),
        room_id: room.id,
        deck_seed: seed,
        board_type: room.board_type,
        status: GameStatus::Active,
        players,
        teams,
        board: Board::new(room.board_type),
        sequences: Vec::new(),
        current_turn_player_id: first_player,
        deck_cursor: cursor,
        shuffled_deck: shuffled,
        turn_history: Vec::new(),
        winner_id: None,
        created_at: Utc::now(),
        last_activity_at: Utc::now(),
        finished_at: None,
    }
}

/// Per-recipient `game_started` events; each human sees the public
/// roster plus only their own hand.
fn game_started_events(game: &Game) -> EventBatch {
    let roster: Vec<GamePlayerView> = game.players.iter().map(GamePlayerView::from).collect();
    game.humans()
        .map(|p| {
            (
                p.player_id,
                ServerEvent::GameStarted(GameStartedPayload {
                    game_id: game.id,
                    room_id: game.room_id,
                    deck_seed: game.deck_seed,
                    board_type: game.board_type,
                    players: roster.clone(),
                    teams: game.teams.clone(),
                    first_player_id: game.current_turn_player_id,
                    hand: p.hand.clone(),
                }),
            )
        })
        .collect()
}

fn first_seat_ai(game: &Game) -> Option<AiTurnRef> {
    game.players
        .first()
        .filter(|p| p.is_ai && game.status == GameStatus::Active)
        .map(|p| AiTurnRef {
            game_id: game.id,
            player_id: p.player_id,
            history_len: game.turn_history.len(),
        })
}

/// The 12-step authoritative turn. Either every mutation lands or none
/// does: all validation happens before the first write.
pub(crate) fn execute_turn(
    state: &mut Registry,
    game_id: GameId,
    player_id: PlayerId,
    card_index: usize,
    row: usize,
    col: usize,
) -> ServerResult<TurnOutcome> {
    let game = state.game_mut(game_id)?;
    if game.status != GameStatus::Active {
        return Err(ServerError::Conflict("game is not active".to_string()));
    }
    if game.current_turn_player_id != player_id {
        return Err(ServerError::Conflict("not your turn".to_string()));
    }
    let seat = game
        .player(player_id)
        .ok_or_else(|| ServerError::Forbidden("not a player in this game".to_string()))?;
    let seat_color = seat.team_color;
    let seat_name = seat.display_name.clone();
    let card = *seat
        .hand
        .get(card_index)
        .ok_or_else(|| ServerError::InvalidArg("card index out of range".to_string()))?;

    let cell = game
        .board
        .cell(row, col)
        .ok_or_else(|| ServerError::InvalidArg("cell out of range".to_string()))?;

    let removes_chip = card.is_one_eyed_jack();
    if card.is_two_eyed_jack() {
        if cell.is_corner() {
            return Err(ServerError::IllegalMove("cannot play onto a corner".to_string()));
        }
        if cell.chip.is_some() {
            return Err(ServerError::IllegalMove("cell is occupied".to_string()));
        }
    } else if removes_chip {
        match cell.chip {
            None => {
                return Err(ServerError::IllegalMove("no chip to remove".to_string()));
            }
            Some(chip) if chip.color == seat_color => {
                return Err(ServerError::IllegalMove(
                    "cannot remove your own team's chip".to_string(),
                ));
            }
            Some(chip) if chip.part_of_sequence => {
                return Err(ServerError::IllegalMove(
                    "chip is locked in a sequence".to_string(),
                ));
            }
            Some(_) => {}
        }
    } else {
        if cell.is_corner() {
            return Err(ServerError::IllegalMove("cannot play onto a corner".to_string()));
        }
        if cell.chip.is_some() {
            return Err(ServerError::IllegalMove("cell is occupied".to_string()));
        }
        if cell.card != Some(card) {
            return Err(ServerError::IllegalMove(
                "card does not match the cell".to_string(),
            ));
        }
    }

    // Validation done; apply the move.
    let cell = game
        .board
        .cell_mut(row, col)
        .ok_or_else(|| ServerError::Internal(format!("cell ({row},{col}) vanished")))?;
    cell.chip = if removes_chip {
        None
    } else {
        Some(Chip::new(seat_color))
    };

    let new_sequences = detector::detect_new_sequences(&mut game.board, seat_color, &game.sequences);
    game.sequences.extend(new_sequences.iter().cloned());

    let team_sequences = game
        .sequences
        .iter()
        .filter(|s| s.team_color == seat_color)
        .count();
    let finished = team_sequences >= SEQUENCES_TO_WIN;
    if finished {
        game.status = GameStatus::Finished;
        game.winner_id = Some(player_id);
        game.finished_at = Some(Utc::now());
    }

    let drawn = game.shuffled_deck.get(game.deck_cursor).copied();
    let seat = game
        .player_mut(player_id)
        .ok_or_else(|| ServerError::Internal("seat vanished mid-turn".to_string()))?;
    seat.hand.remove(card_index);
    if let Some(card) = drawn {
        seat.hand.push(card);
        game.deck_cursor += 1;
    }

    game.turn_history.push(Turn {
        player_id,
        card_index,
        row,
        col,
        card_played: card,
        timestamp: Utc::now(),
    });

    if !finished
        && let Some(next) = game.next_player_id()
    {
        game.current_turn_player_id = next;
    }
    game.last_activity_at = Utc::now();

    let chip_placed = if removes_chip {
        None
    } else {
        game.board.cell(row, col).and_then(|c| c.chip)
    };
    let mut events = game_broadcast(
        game,
        &ServerEvent::TurnMade(TurnMadePayload {
            game_id,
            player_id,
            card_played: card,
            row,
            col,
            chip_placed,
            new_sequences,
            next_player_id: game.current_turn_player_id,
        }),
    );
    if finished {
        events.extend(game_broadcast(
            game,
            &ServerEvent::GameFinished {
                game_id,
                winner_id: player_id,
                winner_name: seat_name,
                winning_team_color: seat_color,
                final_sequences: game.sequences.clone(),
            },
        ));
    }

    let next_ai = if finished {
        None
    } else {
        game.player(game.current_turn_player_id)
            .filter(|p| p.is_ai)
            .map(|p| AiTurnRef {
                game_id,
                player_id: p.player_id,
                history_len: game.turn_history.len(),
            })
    };

    Ok(TurnOutcome { events, next_ai })
}

/// Shared teardown once a finished game's rematch is declined or times
/// out: drop the game and its rematch state, detach the sessions, and
/// hand the room back to the lobby without its AI seats.
pub(crate) fn teardown_finished_game(
    state: &mut Registry,
    game_id: GameId,
    reason: RematchCancelReason,
) -> EventBatch {
    let Some(game) = state.remove_game(game_id) else {
        return Vec::new();
    };
    state.remove_rematch(game_id);

    let mut events = game_broadcast(&game, &ServerEvent::RematchCancelled { reason });

    let human_ids: Vec<PlayerId> = game.humans().map(|p| p.player_id).collect();
    for player_id in human_ids {
        if let Some(session) = state.session_by_player_mut(player_id)
            && session.current_game_id == Some(game_id)
        {
            session.current_game_id = None;
        }
    }

    let mut drop_room = false;
    if let Ok(room) = state.room_mut(game.room_id) {
        if room.game_id == Some(game_id) {
            room.players.retain(|p| !p.is_ai);
            if room.players.is_empty() {
                drop_room = true;
            } else {
                room.status = RoomStatus::Waiting;
                room.game_id = None;
                for p in room.players.iter_mut() {
                    p.is_ready = p.is_host;
                }
                events.extend(room_broadcast(room, &ServerEvent::RoomUpdated { room: room.view() }));
            }
        }
    }
    if drop_room {
        state.remove_room(game.room_id);
    }

    log::info!("game {game_id} torn down ({reason:?})");
    events
}

impl Hub {
    /// Host-only: fill empty seats with AIs, deal, and go.
    pub async fn start_game(
        &self,
        session_id: &str,
        room_id: RoomId,
    ) -> ServerResult<StartGameOutcome> {
        let mut state = self.state().await;
        let caller = state.session(session_id)?.player_id;

        let room = state.room_mut(room_id)?;
        if room.host_id != caller {
            return Err(ServerError::Forbidden(
                "only the host can start the game".to_string(),
            ));
        }
        if room.status != RoomStatus::Waiting {
            return Err(ServerError::Conflict("room is not waiting".to_string()));
        }
        if room.human_count() == 0 {
            return Err(ServerError::Conflict("room has no players".to_string()));
        }

        let mut ai_count = 0;
        while !room.is_full() {
            ai_count += 1;
            room.players.push(RoomPlayer {
                player_id: Uuid::new_v4(),
                display_name: format!("AI {ai_count}"),
                is_host: false,
                is_ready: true,
                is_ai: true,
                team: room.balanced_team(),
                joined_at: Utc::now(),
            });
        }

        let game = build_game_from_room(room, deck::generate_seed());
        let game_id = game.id;
        room.status = RoomStatus::Playing;
        room.game_id = Some(game_id);
        let room_name = room.name.clone();

        let events = game_started_events(&game);
        let first_ai = first_seat_ai(&game);
        let human_ids: Vec<PlayerId> = game.humans().map(|p| p.player_id).collect();
        state.insert_game(game);
        for player_id in human_ids {
            if let Some(session) = state.session_by_player_mut(player_id) {
                session.current_game_id = Some(game_id);
            }
        }
        drop(state);

        log::info!("game {game_id} started in room '{room_name}' with {ai_count} AI seat(s)");
        self.deliver(events);
        if let Some(ai) = first_ai {
            self.schedule_ai_turn(ai);
        }

        Ok(StartGameOutcome {
            game_id,
            missing_players_filled_with_ai: ai_count > 0,
            ai_count,
        })
    }

    /// Validate and execute a human move.
    pub async fn take_turn(
        &self,
        session_id: &str,
        game_id: GameId,
        card_index: usize,
        row: usize,
        col: usize,
    ) -> ServerResult<()> {
        let mut state = self.state().await;
        let caller = state.session(session_id)?.player_id;
        let outcome = execute_turn(&mut state, game_id, caller, card_index, row, col)?;
        drop(state);

        self.deliver(outcome.events);
        if let Some(ai) = outcome.next_ai {
            self.schedule_ai_turn(ai);
        }
        Ok(())
    }

    /// Fired by the AI delay timer. Re-validates against the live game
    /// and silently stands down when the world moved on.
    pub(crate) async fn run_ai_turn(&self, turn: AiTurnRef) {
        let mut state = self.state().await;
        let Ok(game) = state.game(turn.game_id) else {
            return;
        };
        if game.status != GameStatus::Active
            || game.current_turn_player_id != turn.player_id
            || game.turn_history.len() != turn.history_len
        {
            return;
        }
        let Some(seat) = game.player(turn.player_id) else {
            return;
        };
        if !seat.is_ai {
            return;
        }

        let hand = seat.hand.clone();
        let color = seat.team_color;
        let opponent = game.opponent_color_of(color);
        let turn_number = game.turns_taken_by(turn.player_id);
        let chosen = {
            let mut selector = MoveSelector::new();
            selector.select_move(
                SERVER_AI_DIFFICULTY,
                &hand,
                &game.board,
                color,
                opponent,
                turn_number,
            )
        };
        let Some(ai_move) = chosen else {
            // A double deck with Jacks always playable cannot run dry; this
            // is an invariant violation, and the turn is left un-advanced.
            log::error!(
                "AI {} found no legal move in game {}",
                turn.player_id,
                turn.game_id
            );
            return;
        };

        match execute_turn(
            &mut state,
            turn.game_id,
            turn.player_id,
            ai_move.card_index,
            ai_move.row,
            ai_move.col,
        ) {
            Ok(outcome) => {
                drop(state);
                self.deliver(outcome.events);
                if let Some(next) = outcome.next_ai {
                    self.schedule_ai_turn(next);
                }
            }
            Err(err) => {
                log::error!(
                    "AI move rejected in game {}: {}",
                    turn.game_id,
                    err.log_detail()
                );
            }
        }
    }

    /// Vote on a rematch of a finished game; the first vote opens the
    /// 30-second window, unanimous human approval starts the new game.
    pub async fn rematch_vote(
        &self,
        session_id: &str,
        game_id: GameId,
        vote: bool,
    ) -> ServerResult<RematchStateView> {
        let mut state = self.state().await;
        let caller = state.session(session_id)?.player_id;

        let game = state.game(game_id)?;
        if game.status != GameStatus::Finished {
            return Err(ServerError::Conflict("game is not finished".to_string()));
        }
        let seat = game
            .player(caller)
            .ok_or_else(|| ServerError::Forbidden("not a player in this game".to_string()))?;
        if seat.is_ai {
            return Err(ServerError::Forbidden("not a player in this game".to_string()));
        }
        let room_id = game.room_id;
        let required_votes = game.humans().count();

        let mut created = false;
        if state.rematch(game_id).is_none() {
            state.insert_rematch(RematchState {
                game_id,
                active: true,
                votes: Vec::new(),
                deadline: Utc::now()
                    + chrono::Duration::seconds(self.config().rematch_window_secs as i64),
                required_votes,
            });
            created = true;
        }
        let rematch = state
            .rematch_mut(game_id)
            .ok_or_else(|| ServerError::Internal("rematch state missing after insert".to_string()))?;
        rematch.set_vote(caller, vote);
        let view = rematch.view();
        let approved = rematch.is_approved();

        let game = state.game(game_id)?;
        let mut events = game_broadcast(
            game,
            &ServerEvent::RematchVote {
                rematch: view.clone(),
            },
        );

        let mut first_ai = None;
        if approved {
            state.room(room_id)?;
            state.remove_rematch(game_id);
            state.remove_game(game_id);

            let room = state.room_mut(room_id)?;
            let new_game = build_game_from_room(room, deck::generate_seed());
            let new_game_id = new_game.id;
            room.game_id = Some(new_game_id);
            room.status = RoomStatus::Playing;

            events.extend(game_broadcast(
                &new_game,
                &ServerEvent::RematchStarted { new_game_id },
            ));
            events.extend(game_started_events(&new_game));
            first_ai = first_seat_ai(&new_game);

            let human_ids: Vec<PlayerId> = new_game.humans().map(|p| p.player_id).collect();
            state.insert_game(new_game);
            for player_id in human_ids {
                if let Some(session) = state.session_by_player_mut(player_id) {
                    session.current_game_id = Some(new_game_id);
                }
            }
            log::info!("rematch approved: game {game_id} replaced by {new_game_id}");
        }
        drop(state);

        self.deliver(events);
        if created && !approved {
            self.schedule_rematch_deadline(game_id);
        }
        if let Some(ai) = first_ai {
            self.schedule_ai_turn(ai);
        }
        Ok(view)
    }

    /// Decline a rematch, tearing the voting state down immediately.
    pub async fn cancel_rematch(&self, session_id: &str, game_id: GameId) -> ServerResult<()> {
        let mut state = self.state().await;
        let caller = state.session(session_id)?.player_id;

        let game = state.game(game_id)?;
        if game.status != GameStatus::Finished {
            return Err(ServerError::Conflict("game is not finished".to_string()));
        }
        if game.player(caller).is_none_or(|p| p.is_ai) {
            return Err(ServerError::Forbidden(
                "not a player in this game".to_string(),
            ));
        }

        let events = teardown_finished_game(&mut state, game_id, RematchCancelReason::PlayerDeclined);
        drop(state);

        self.deliver(events);
        Ok(())
    }
}
