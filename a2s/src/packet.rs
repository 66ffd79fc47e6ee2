//! A2S_INFO wire format.
//!
//! Every datagram starts with a 4 byte header: `FF FF FF FF` for a single
//! packet or `FE FF FF FF` for one fragment of a split response. Integers are
//! little endian, strings are NUL terminated.

use shared::ServerInfo;
use std::time::Duration;
use thiserror::Error;

pub const SINGLE_PACKET_HEADER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
pub const SPLIT_PACKET_HEADER: [u8; 4] = [0xFE, 0xFF, 0xFF, 0xFF];

const A2S_INFO: u8 = 0x54;
const S2C_CHALLENGE: u8 = 0x41;
const S2A_INFO: u8 = 0x49;
const S2A_INFO_GOLDSRC: u8 = 0x6D;
const INFO_PAYLOAD: &[u8] = b"Source Engine Query\0";

// "The Ship" carries three extra bytes after VAC
const APP_ID_THE_SHIP: u16 = 2400;

const EDF_PORT: u8 = 0x80;
const EDF_STEAM_ID: u8 = 0x10;
const EDF_SPECTATOR: u8 = 0x40;
const EDF_KEYWORDS: u8 = 0x20;
const EDF_GAME_ID: u8 = 0x01;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid server address `{0}`")]
    Address(String),
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("split responses are not supported")]
    SplitResponse,
    #[error("server answered {0} challenges without sending info")]
    ChallengeLoop(usize),
}

/// A decoded server reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Info(ServerInfo),
    Challenge([u8; 4]),
}

/// Builds an `A2S_INFO` request, appending the challenge if the server asked
/// for one.
pub fn info_request(challenge: Option<[u8; 4]>) -> Vec<u8> {
    let mut request = Vec::with_capacity(4 + 1 + INFO_PAYLOAD.len() + 4);
    request.extend_from_slice(&SINGLE_PACKET_HEADER);
    request.push(A2S_INFO);
    request.extend_from_slice(INFO_PAYLOAD);
    if let Some(challenge) = challenge {
        request.extend_from_slice(&challenge);
    }
    request
}

/// Classifies and decodes one datagram.
pub fn parse_response(data: &[u8]) -> Result<Response, QueryError> {
    let mut reader = Reader::new(data);

    let header = reader.array::<4>()?;
    if header == SPLIT_PACKET_HEADER {
        return Err(QueryError::SplitResponse);
    }
    if header != SINGLE_PACKET_HEADER {
        return Err(QueryError::Malformed(format!("unknown header {:02x?}", header)));
    }

    match reader.u8()? {
        S2C_CHALLENGE => Ok(Response::Challenge(reader.array::<4>()?)),
        S2A_INFO => parse_info(&mut reader).map(Response::Info),
        S2A_INFO_GOLDSRC => Err(QueryError::Malformed("obsolete GoldSource response".into())),
        other => Err(QueryError::Malformed(format!("unexpected response type 0x{:02x}", other))),
    }
}

fn parse_info(reader: &mut Reader<'_>) -> Result<ServerInfo, QueryError> {
    let mut info = ServerInfo {
        protocol: reader.u8()?,
        name: reader.cstring()?,
        map: reader.cstring()?,
        folder: reader.cstring()?,
        game: reader.cstring()?,
        id: reader.u16()?,
        players: reader.u8()?,
        max_players: reader.u8()?,
        bots: reader.u8()?,
        server_type: char::from(reader.u8()?),
        environment: char::from(reader.u8()?),
        visibility: reader.u8()? != 0,
        vac: reader.u8()? != 0,
        ..Default::default()
    };

    if info.id == APP_ID_THE_SHIP {
        reader.skip(3)?;
    }

    info.version = reader.cstring()?;

    if reader.is_empty() {
        return Ok(info);
    }

    let flags = reader.u8()?;
    if flags & EDF_PORT != 0 {
        info.port = Some(reader.u16()?);
    }
    if flags & EDF_STEAM_ID != 0 {
        info.steam_id = Some(reader.u64()?);
    }
    if flags & EDF_SPECTATOR != 0 {
        info.spectator_port = Some(reader.u16()?);
        info.spectator_name = Some(reader.cstring()?);
    }
    if flags & EDF_KEYWORDS != 0 {
        info.keywords = Some(reader.cstring()?);
    }
    if flags & EDF_GAME_ID != 0 {
        info.game_id = Some(reader.u64()?);
    }

    Ok(info)
}

/// Cursor over a received datagram.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], QueryError> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(QueryError::Malformed(format!(
                "truncated at byte {}, wanted {} more",
                self.pos, len
            )));
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<(), QueryError> {
        self.take(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], QueryError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, QueryError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, QueryError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, QueryError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn cstring(&mut self) -> Result<String, QueryError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| QueryError::Malformed(format!("unterminated string at byte {}", self.pos)))?;
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(text)
    }
}

/// Test helper building `S2A_INFO` datagrams.
#[cfg(any(test, feature = "test-util"))]
pub mod fixture {
    use super::*;

    pub fn info_datagram(info: &ServerInfo) -> Vec<u8> {
        let mut out = SINGLE_PACKET_HEADER.to_vec();
        out.push(S2A_INFO);
        out.push(info.protocol);
        for text in [&info.name, &info.map, &info.folder, &info.game] {
            out.extend_from_slice(text.as_bytes());
            out.push(0);
        }
        out.extend_from_slice(&info.id.to_le_bytes());
        out.extend_from_slice(&[
            info.players,
            info.max_players,
            info.bots,
            info.server_type as u8,
            info.environment as u8,
            u8::from(info.visibility),
            u8::from(info.vac),
        ]);
        out.extend_from_slice(info.version.as_bytes());
        out.push(0);

        let mut flags = 0;
        let mut extra = Vec::new();
        if let Some(port) = info.port {
            flags |= EDF_PORT;
            extra.extend_from_slice(&port.to_le_bytes());
        }
        if let Some(steam_id) = info.steam_id {
            flags |= EDF_STEAM_ID;
            extra.extend_from_slice(&steam_id.to_le_bytes());
        }
        if let (Some(port), Some(name)) = (info.spectator_port, &info.spectator_name) {
            flags |= EDF_SPECTATOR;
            extra.extend_from_slice(&port.to_le_bytes());
            extra.extend_from_slice(name.as_bytes());
            extra.push(0);
        }
        if let Some(keywords) = &info.keywords {
            flags |= EDF_KEYWORDS;
            extra.extend_from_slice(keywords.as_bytes());
            extra.push(0);
        }
        if let Some(game_id) = info.game_id {
            flags |= EDF_GAME_ID;
            extra.extend_from_slice(&game_id.to_le_bytes());
        }
        if flags != 0 {
            out.push(flags);
            out.extend_from_slice(&extra);
        }
        out
    }

    pub fn challenge_datagram(challenge: [u8; 4]) -> Vec<u8> {
        let mut out = SINGLE_PACKET_HEADER.to_vec();
        out.push(S2C_CHALLENGE);
        out.extend_from_slice(&challenge);
        out
    }
}
