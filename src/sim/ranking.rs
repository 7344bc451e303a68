/// Persisted leaderboard: top runs by clear time.
///
/// ## File format:
///   Key-value lines, one entry per index:
///   ```
///   count=2
///   name_0=MIRA
///   time_0=184.350
///   deaths_0=3
///   date_0=1722800000
///   ```
///
/// The board keeps at most `MAX_ENTRIES` rows, sorted fastest-first.
/// A missing or unreadable file reads as an empty board; a corrupt
/// entry is skipped rather than failing the load.

use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_ENTRIES: usize = 10;
pub const MAX_NAME_LEN: usize = 16;

const RANKING_FILE: &str = "rankings.dat";

#[derive(Clone, Debug)]
pub struct RankingEntry {
    pub name: String,
    /// Whole-run clear time in seconds.
    pub clear_time: f32,
    pub deaths: u32,
    /// Seconds since the Unix epoch when the run was recorded.
    pub date: u64,
}

#[derive(Clone, Debug, Default)]
pub struct RankingBoard {
    pub entries: Vec<RankingEntry>,
}

impl RankingBoard {
    /// Would a run with this clear time make the board?
    pub fn qualifies(&self, clear_time: f32) -> bool {
        self.entries.len() < MAX_ENTRIES
            || self
                .entries
                .last()
                .map_or(true, |worst| clear_time < worst.clear_time)
    }

    /// Insert a run, keep the board sorted fastest-first, drop overflow.
    pub fn add(&mut self, name: &str, clear_time: f32, deaths: u32) {
        let name: String = name.chars().take(MAX_NAME_LEN).collect();
        self.entries.push(RankingEntry {
            name,
            clear_time,
            deaths,
            date: now_epoch(),
        });
        self.entries
            .sort_by(|a, b| a.clear_time.total_cmp(&b.clear_time));
        self.entries.truncate(MAX_ENTRIES);
    }

    // ── Persistence ──

    pub fn load() -> RankingBoard {
        let path = ranking_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(_) => return RankingBoard::default(),
        };
        parse_board(&text)
    }

    pub fn save(&self) -> io::Result<()> {
        let mut out = String::new();
        out.push_str(&format!("count={}\n", self.entries.len()));
        for (i, e) in self.entries.iter().enumerate() {
            out.push_str(&format!("name_{}={}\n", i, e.name));
            out.push_str(&format!("time_{}={:.3}\n", i, e.clear_time));
            out.push_str(&format!("deaths_{}={}\n", i, e.deaths));
            out.push_str(&format!("date_{}={}\n", i, e.date));
        }
        std::fs::write(ranking_path(), out)
    }
}

fn field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|l| l.strip_prefix(key)?.strip_prefix('='))
}

fn parse_board(text: &str) -> RankingBoard {
    let count: usize = match field(text, "count").and_then(|v| v.parse().ok()) {
        Some(n) => n,
        None => return RankingBoard::default(),
    };

    let mut board = RankingBoard::default();
    for i in 0..count.min(MAX_ENTRIES) {
        let name = match field(text, &format!("name_{i}")) {
            Some(n) => n.to_string(),
            None => continue,
        };
        let clear_time = field(text, &format!("time_{i}"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let deaths = field(text, &format!("deaths_{i}"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let date = field(text, &format!("date_{i}"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        board.entries.push(RankingEntry {
            name,
            clear_time,
            deaths,
            date,
        });
    }
    board
        .entries
        .sort_by(|a, b| a.clear_time.total_cmp(&b.clear_time));
    board
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Where the board lives: the executable's directory when writable
/// (portable installs), otherwise XDG data home, otherwise CWD.
fn ranking_path() -> PathBuf {
    data_dir().join(RANKING_FILE)
}

fn data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_embertide");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/embertide");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_sorts_fastest_first_and_truncates() {
        let mut board = RankingBoard::default();
        for i in 0..12 {
            board.add(&format!("P{i}"), 100.0 + i as f32, i);
        }
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.entries[0].name, "P0");
        board.add("FAST", 1.0, 0);
        assert_eq!(board.entries[0].name, "FAST");
        assert_eq!(board.entries.len(), MAX_ENTRIES);
    }

    #[test]
    fn qualification_checks_the_slowest_kept_run() {
        let mut board = RankingBoard::default();
        assert!(board.qualifies(9999.0));
        for i in 0..MAX_ENTRIES {
            board.add("X", 100.0 + i as f32, 0);
        }
        assert!(board.qualifies(50.0));
        assert!(!board.qualifies(500.0));
    }

    #[test]
    fn names_are_clamped() {
        let mut board = RankingBoard::default();
        board.add("ABCDEFGHIJKLMNOPQRSTUV", 10.0, 0);
        assert_eq!(board.entries[0].name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn text_round_trip() {
        let mut board = RankingBoard::default();
        board.add("MIRA", 184.35, 3);
        board.add("OBAG", 90.0, 0);

        let mut text = format!("count={}\n", board.entries.len());
        for (i, e) in board.entries.iter().enumerate() {
            text.push_str(&format!(
                "name_{i}={}\ntime_{i}={:.3}\ndeaths_{i}={}\ndate_{i}={}\n",
                e.name, e.clear_time, e.deaths, e.date
            ));
        }

        let back = parse_board(&text);
        assert_eq!(back.entries.len(), 2);
        assert_eq!(back.entries[0].name, "OBAG");
        assert!((back.entries[1].clear_time - 184.35).abs() < 0.01);
        assert_eq!(back.entries[1].deaths, 3);
    }

    #[test]
    fn garbage_reads_as_empty_board() {
        assert!(parse_board("").entries.is_empty());
        assert!(parse_board("not a board").entries.is_empty());
        assert!(parse_board("count=zzz").entries.is_empty());
    }
}
