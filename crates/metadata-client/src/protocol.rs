//! Protocol types for the metadata hub.
//!
//! These are the values carried by server pushes and client calls. How
//! they are framed on the wire is the transport's business; see
//! `transport::envelope` for the WebSocket encoding.

use metadata_common::ProtocolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type UserId = i32;
pub type RoomId = i64;
pub type QueueId = i32;

// ---------------------------------------------------------------------------
// Method names
// ---------------------------------------------------------------------------

/// Hub method names, shared by both directions.
pub mod methods {
    // server -> client
    pub const BEATMAP_SETS_CHANGED: &str = "BeatmapSetsChanged";
    pub const USER_PRESENCE_UPDATED: &str = "UserPresenceUpdated";
    pub const FRIEND_PRESENCE_UPDATED: &str = "FriendPresenceUpdated";
    pub const DAILY_CHALLENGE_UPDATED: &str = "DailyChallengeUpdated";
    pub const MULTIPLAYER_ROOM_SCORE_SET: &str = "MultiplayerRoomScoreSet";
    pub const DISCONNECT_REQUESTED: &str = "DisconnectRequested";

    // client -> server
    pub const GET_CHANGES_SINCE: &str = "GetChangesSince";
    pub const BEATMAP_SETS_UPDATED: &str = "BeatmapSetsUpdated";
    pub const UPDATE_ACTIVITY: &str = "UpdateActivity";
    pub const UPDATE_STATUS: &str = "UpdateStatus";
    pub const BEGIN_WATCHING_USER_PRESENCE: &str = "BeginWatchingUserPresence";
    pub const END_WATCHING_USER_PRESENCE: &str = "EndWatchingUserPresence";
    pub const BEGIN_WATCHING_MULTIPLAYER_ROOM: &str = "BeginWatchingMultiplayerRoom";
    pub const END_WATCHING_MULTIPLAYER_ROOM: &str = "EndWatchingMultiplayerRoom";
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Online status a user chooses to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Offline,
    DoNotDisturb,
    Online,
}

/// What a user is currently doing in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserActivity {
    ChoosingBeatmap,
    InSoloGame {
        beatmap_id: i32,
        ruleset_id: i32,
    },
    InMultiplayerGame {
        room_id: RoomId,
        beatmap_id: i32,
        ruleset_id: i32,
    },
    SpectatingUser {
        user_id: UserId,
    },
    WatchingReplay {
        score_id: i64,
    },
    EditingBeatmap {
        beatmap_id: i32,
    },
    InLobby {
        room_id: RoomId,
    },
    InDailyChallengeLobby,
    Idle,
}

/// A user's activity and status. Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresence {
    #[serde(default)]
    pub activity: Option<UserActivity>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl UserPresence {
    pub fn new(activity: Option<UserActivity>, status: Option<UserStatus>) -> Self {
        Self { activity, status }
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_none() && self.status.is_none()
    }
}

// ---------------------------------------------------------------------------
// Catalogue, daily challenge, rooms
// ---------------------------------------------------------------------------

/// A contiguous range of beatmap catalogue changes.
///
/// `queue_id` is the cursor to pass to the next `GetChangesSince` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatmapUpdates {
    pub queue_id: QueueId,
    pub beatmap_set_ids: Vec<i32>,
}

/// The currently running daily challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallengeInfo {
    pub room_id: RoomId,
}

/// Aggregate score statistics for one playlist item of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplayerPlaylistItemStats {
    pub playlist_item_id: i64,
    #[serde(default)]
    pub total_score_distribution: Vec<i64>,
    pub cumulative_score: i64,
    pub last_processed_score_id: u64,
}

/// A score submitted in a watched room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplayerRoomScoreSetEvent {
    pub room_id: RoomId,
    pub playlist_item_id: i64,
    pub score_id: i64,
    pub user_id: UserId,
    pub total_score: i64,
    #[serde(default)]
    pub new_rank: Option<i32>,
}

// ---------------------------------------------------------------------------
// Server pushes
// ---------------------------------------------------------------------------

/// A push from the metadata hub.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    BeatmapSetsChanged {
        beatmap_set_ids: Vec<i32>,
    },
    UserPresenceUpdated {
        user_id: UserId,
        presence: Option<UserPresence>,
    },
    FriendPresenceUpdated {
        user_id: UserId,
        presence: Option<UserPresence>,
    },
    DailyChallengeUpdated(Option<DailyChallengeInfo>),
    MultiplayerRoomScoreSet(MultiplayerRoomScoreSetEvent),
    DisconnectRequested,
}

impl ServerEvent {
    /// The hub method this push arrives as.
    pub fn method(&self) -> &'static str {
        match self {
            Self::BeatmapSetsChanged { .. } => methods::BEATMAP_SETS_CHANGED,
            Self::UserPresenceUpdated { .. } => methods::USER_PRESENCE_UPDATED,
            Self::FriendPresenceUpdated { .. } => methods::FRIEND_PRESENCE_UPDATED,
            Self::DailyChallengeUpdated(_) => methods::DAILY_CHALLENGE_UPDATED,
            Self::MultiplayerRoomScoreSet(_) => methods::MULTIPLAYER_ROOM_SCORE_SET,
            Self::DisconnectRequested => methods::DISCONNECT_REQUESTED,
        }
    }
}

/// Decode a push from its method name and positional argument array.
///
/// `Null` is accepted as an empty argument list.
pub fn decode_push(method: &str, args: Value) -> Result<ServerEvent, ProtocolError> {
    let args = match args {
        Value::Array(args) => args,
        Value::Null => Vec::new(),
        other => {
            return Err(malformed(
                method,
                format!("expected an argument array, got {other}"),
            ))
        }
    };

    match method {
        methods::BEATMAP_SETS_CHANGED => {
            let [ids] = take_args::<1>(method, args)?;
            Ok(ServerEvent::BeatmapSetsChanged {
                beatmap_set_ids: from_arg(method, ids)?,
            })
        }
        methods::USER_PRESENCE_UPDATED => {
            let [user_id, presence] = take_args::<2>(method, args)?;
            Ok(ServerEvent::UserPresenceUpdated {
                user_id: from_arg(method, user_id)?,
                presence: from_arg(method, presence)?,
            })
        }
        methods::FRIEND_PRESENCE_UPDATED => {
            let [user_id, presence] = take_args::<2>(method, args)?;
            Ok(ServerEvent::FriendPresenceUpdated {
                user_id: from_arg(method, user_id)?,
                presence: from_arg(method, presence)?,
            })
        }
        methods::DAILY_CHALLENGE_UPDATED => {
            let [info] = take_args::<1>(method, args)?;
            Ok(ServerEvent::DailyChallengeUpdated(from_arg(method, info)?))
        }
        methods::MULTIPLAYER_ROOM_SCORE_SET => {
            let [event] = take_args::<1>(method, args)?;
            Ok(ServerEvent::MultiplayerRoomScoreSet(from_arg(method, event)?))
        }
        methods::DISCONNECT_REQUESTED => {
            let [] = take_args::<0>(method, args)?;
            Ok(ServerEvent::DisconnectRequested)
        }
        _ => Err(ProtocolError::UnknownMethod(method.to_string())),
    }
}

fn malformed(method: &str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedPayload {
        method: method.to_string(),
        reason: reason.into(),
    }
}

fn take_args<const N: usize>(method: &str, args: Vec<Value>) -> Result<[Value; N], ProtocolError> {
    let len = args.len();
    <[Value; N]>::try_from(args)
        .map_err(|_| malformed(method, format!("expected {N} arguments, got {len}")))
}

fn from_arg<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| malformed(method, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_beatmap_sets_changed() {
        let event = decode_push(methods::BEATMAP_SETS_CHANGED, json!([[1, 2, 2]])).unwrap();
        assert_eq!(
            event,
            ServerEvent::BeatmapSetsChanged {
                beatmap_set_ids: vec![1, 2, 2]
            }
        );
    }

    #[test]
    fn decode_presence_with_activity() {
        let event = decode_push(
            methods::FRIEND_PRESENCE_UPDATED,
            json!([
                55,
                {
                    "activity": { "type": "in_solo_game", "beatmap_id": 10, "ruleset_id": 0 },
                    "status": "online"
                }
            ]),
        )
        .unwrap();

        assert_eq!(
            event,
            ServerEvent::FriendPresenceUpdated {
                user_id: 55,
                presence: Some(UserPresence::new(
                    Some(UserActivity::InSoloGame {
                        beatmap_id: 10,
                        ruleset_id: 0
                    }),
                    Some(UserStatus::Online),
                )),
            }
        );
    }

    #[test]
    fn decode_presence_removal() {
        let event = decode_push(methods::USER_PRESENCE_UPDATED, json!([9, null])).unwrap();
        assert_eq!(
            event,
            ServerEvent::UserPresenceUpdated {
                user_id: 9,
                presence: None
            }
        );
    }

    #[test]
    fn decode_daily_challenge_cleared() {
        let event = decode_push(methods::DAILY_CHALLENGE_UPDATED, json!([null])).unwrap();
        assert_eq!(event, ServerEvent::DailyChallengeUpdated(None));
    }

    #[test]
    fn decode_room_score_set() {
        let event = decode_push(
            methods::MULTIPLAYER_ROOM_SCORE_SET,
            json!([{
                "room_id": 1000,
                "playlist_item_id": 3,
                "score_id": 77,
                "user_id": 2,
                "total_score": 950000
            }]),
        )
        .unwrap();

        match event {
            ServerEvent::MultiplayerRoomScoreSet(e) => {
                assert_eq!(e.room_id, 1000);
                assert_eq!(e.new_rank, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn decode_disconnect_requested_accepts_null_args() {
        let event = decode_push(methods::DISCONNECT_REQUESTED, Value::Null).unwrap();
        assert_eq!(event, ServerEvent::DisconnectRequested);
        assert_eq!(event.method(), methods::DISCONNECT_REQUESTED);
    }

    #[test]
    fn unknown_method_is_protocol_error() {
        let err = decode_push("SomethingNew", json!([])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMethod(ref m) if m == "SomethingNew"));
    }

    #[test]
    fn wrong_arity_is_malformed() {
        let err = decode_push(methods::USER_PRESENCE_UPDATED, json!([1])).unwrap_err();
        assert!(err.to_string().contains("expected 2 arguments, got 1"));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = decode_push(methods::BEATMAP_SETS_CHANGED, json!(["not ids"])).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { .. }));

        let err = decode_push(methods::BEATMAP_SETS_CHANGED, json!({"ids": []})).unwrap_err();
        assert!(err.to_string().contains("expected an argument array"));
    }

    #[test]
    fn empty_presence_default() {
        let presence = UserPresence::default();
        assert!(presence.is_empty());
        let parsed: UserPresence = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, presence);
    }
}
