//! Entity records and the in-memory registry that owns them.

pub mod entities;
pub mod registry;

pub use entities::{
    Game, GameId, GameMode, GamePlayer, GamePlayerView, GameSnapshot, GameStatus, GameTeam,
    LobbyRoomView, PlayerId, RematchState, RematchStateView, RematchVote, Room, RoomId,
    RoomPlayer, RoomPlayerView, RoomStatus, RoomView, Session, SessionId, Turn,
};
pub use registry::Registry;
