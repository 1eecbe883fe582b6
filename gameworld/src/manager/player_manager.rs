//! 플레이어 매니저
//!
//! 접속 중인 플레이어 id를 관리합니다. 외부에서는 이름 기반 호출
//! (`login`, `logout`)로 접근하며, 페이로드는 8바이트 빅엔디언 플레이어 id입니다.

use super::Manager;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uranus_shared::Reactor;

pub const METHOD_LOGIN: &str = "login";
pub const METHOD_LOGOUT: &str = "logout";

/// 플레이어 id 페이로드 생성
pub fn player_payload(player_id: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u64(player_id);
    buf.freeze()
}

fn parse_player_id(mut payload: &[u8]) -> Option<u64> {
    if payload.remaining() != 8 {
        return None;
    }
    Some(payload.get_u64())
}

/// 플레이어 매니저
#[derive(Debug, Default)]
pub struct PlayerManager {
    online: HashSet<u64>,
    initialized: bool,
    daily_logins: u64,
    /// 알 수 없는 메서드 호출 수
    unknown_calls: u64,
    /// 페이로드 형식이 잘못된 호출 수
    malformed_calls: u64,
    ticks: u64,
    last_tick: Option<DateTime<Utc>>,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, player_id: u64) -> bool {
        if !self.online.insert(player_id) {
            debug!("이미 접속 중인 플레이어: {}", player_id);
            return false;
        }
        self.daily_logins += 1;
        info!("플레이어 접속: {} (접속자 {}명)", player_id, self.online.len());
        true
    }

    pub fn logout(&mut self, player_id: u64) -> bool {
        if !self.online.remove(&player_id) {
            debug!("접속하지 않은 플레이어 로그아웃 무시: {}", player_id);
            return false;
        }
        info!("플레이어 접속 종료: {} (접속자 {}명)", player_id, self.online.len());
        true
    }

    pub fn is_online(&self, player_id: u64) -> bool {
        self.online.contains(&player_id)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    pub fn daily_logins(&self) -> u64 {
        self.daily_logins
    }

    pub fn unknown_calls(&self) -> u64 {
        self.unknown_calls
    }

    pub fn malformed_calls(&self) -> u64 {
        self.malformed_calls
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }
}

impl Reactor for PlayerManager {
    fn invoke(&mut self, method: &str, payload: &[u8]) {
        let action: fn(&mut Self, u64) -> bool = match method {
            METHOD_LOGIN => Self::login,
            METHOD_LOGOUT => Self::logout,
            other => {
                self.unknown_calls += 1;
                debug!("PlayerManager 알 수 없는 메서드: {}", other);
                return;
            }
        };

        match parse_player_id(payload) {
            Some(player_id) => {
                action(self, player_id);
            }
            None => {
                self.malformed_calls += 1;
                warn!(
                    "잘못된 플레이어 페이로드: {} ({} bytes)",
                    method,
                    payload.len()
                );
            }
        }
    }
}

impl Manager for PlayerManager {
    fn name(&self) -> &'static str {
        "PlayerManager"
    }

    fn init(&mut self) {
        self.initialized = true;
    }

    fn wants_tick(&self) -> bool {
        true
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        self.ticks += 1;
        self.last_tick = Some(now);
    }

    fn on_day_change(&mut self) {
        info!("일일 접속 집계 초기화: {}회", self.daily_logins);
        self.daily_logins = 0;
    }
}
