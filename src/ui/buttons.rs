use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::storage::VoteKind;

/// IDs personalizados para los botones
pub mod button_ids {
    pub const VOTE_UP: &str = "vote_up";
    pub const VOTE_DOWN: &str = "vote_down";
    pub const VOTE_REPORT: &str = "vote_report";
    pub const PLAY_PAUSE: &str = "music_play_pause";
    pub const PREVIOUS: &str = "music_previous";
    pub const SKIP: &str = "music_skip";
    pub const STOP: &str = "music_stop";
    pub const QUEUE: &str = "music_queue";
    pub const REPLAY: &str = "music_replay";
    pub const VOLUME_DOWN: &str = "music_volume_down";
    pub const VOLUME_UP: &str = "music_volume_up";

    /// Prefijos de paginación, seguidos de `:<página>`.
    pub const QUEUE_PAGE: &str = "queue_page";
    pub const PLAYLIST_PAGE: &str = "playlist_page";
}

/// Acción decodificada a partir del `custom_id` de un componente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Vote(VoteKind),
    TogglePause,
    Previous,
    Skip,
    Stop,
    ShowQueue,
    Replay,
    VolumeDown,
    VolumeUp,
    QueuePage(usize),
    PlaylistPage(usize),
}

impl ButtonAction {
    pub fn parse(custom_id: &str) -> Option<Self> {
        let action = match custom_id {
            button_ids::VOTE_UP => ButtonAction::Vote(VoteKind::Up),
            button_ids::VOTE_DOWN => ButtonAction::Vote(VoteKind::Down),
            button_ids::VOTE_REPORT => ButtonAction::Vote(VoteKind::Report),
            button_ids::PLAY_PAUSE => ButtonAction::TogglePause,
            button_ids::PREVIOUS => ButtonAction::Previous,
            button_ids::SKIP => ButtonAction::Skip,
            button_ids::STOP => ButtonAction::Stop,
            button_ids::QUEUE => ButtonAction::ShowQueue,
            button_ids::REPLAY => ButtonAction::Replay,
            button_ids::VOLUME_DOWN => ButtonAction::VolumeDown,
            button_ids::VOLUME_UP => ButtonAction::VolumeUp,
            other => {
                let (prefix, page) = other.split_once(':')?;
                let page = page.parse().ok()?;
                match prefix {
                    button_ids::QUEUE_PAGE => ButtonAction::QueuePage(page),
                    button_ids::PLAYLIST_PAGE => ButtonAction::PlaylistPage(page),
                    _ => return None,
                }
            }
        };
        Some(action)
    }
}

/// Paso de volumen de los botones 🔉 y 🔊, en puntos porcentuales.
pub const VOLUME_STEP: u16 = 10;

/// Controles del mensaje de "Reproduciendo Ahora": votos y reproducción.
pub fn now_playing_buttons() -> Vec<CreateActionRow> {
    let votes = CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::VOTE_UP)
            .emoji('👍')
            .style(ButtonStyle::Success),
        CreateButton::new(button_ids::VOTE_DOWN)
            .emoji('👎')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::VOTE_REPORT)
            .emoji('⚠')
            .label("Reportar")
            .style(ButtonStyle::Danger),
    ]);

    let controls = CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::PREVIOUS)
            .emoji('⏮')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::PLAY_PAUSE)
            .emoji('⏯')
            .style(ButtonStyle::Primary),
        CreateButton::new(button_ids::SKIP)
            .emoji('⏭')
            .style(ButtonStyle::Primary),
        CreateButton::new(button_ids::STOP)
            .emoji('⏹')
            .style(ButtonStyle::Danger),
        CreateButton::new(button_ids::QUEUE)
            .label("Cola")
            .emoji('📋')
            .style(ButtonStyle::Secondary),
    ]);

    let extras = CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::REPLAY)
            .emoji('🔄')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::VOLUME_DOWN)
            .emoji('🔉')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::VOLUME_UP)
            .emoji('🔊')
            .style(ButtonStyle::Secondary),
    ]);

    vec![votes, controls, extras]
}

/// Crea controles de paginación. `prefix` es uno de los prefijos de
/// [`button_ids`].
pub fn pagination_buttons(prefix: &str, current_page: usize, total_pages: usize) -> CreateActionRow {
    let prev_btn = CreateButton::new(format!("{}:{}", prefix, current_page.saturating_sub(1).max(1)))
        .emoji('◀')
        .style(ButtonStyle::Primary)
        .disabled(current_page <= 1);

    let page_btn = CreateButton::new(format!("{}_info", prefix))
        .label(format!("{}/{}", current_page, total_pages))
        .style(ButtonStyle::Secondary)
        .disabled(true);

    let next_btn = CreateButton::new(format!("{}:{}", prefix, (current_page + 1).min(total_pages)))
        .emoji('▶')
        .style(ButtonStyle::Primary)
        .disabled(current_page >= total_pages);

    CreateActionRow::Buttons(vec![prev_btn, page_btn, next_btn])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed_ids() {
        assert_eq!(
            ButtonAction::parse(button_ids::VOTE_REPORT),
            Some(ButtonAction::Vote(VoteKind::Report))
        );
        assert_eq!(ButtonAction::parse(button_ids::SKIP), Some(ButtonAction::Skip));
        assert_eq!(
            ButtonAction::parse("music_play_pause"),
            Some(ButtonAction::TogglePause)
        );
        assert_eq!(
            ButtonAction::parse(button_ids::VOLUME_DOWN),
            Some(ButtonAction::VolumeDown)
        );
        assert_eq!(ButtonAction::parse("nonsense"), None);
    }

    #[test]
    fn test_now_playing_rows_fit_discord_limits() {
        let rows = now_playing_buttons();
        let json = serde_json::to_value(&rows).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 3);

        for row in rows {
            let buttons = row["components"].as_array().unwrap();
            assert!(buttons.len() <= 5);
            for button in buttons {
                let id = button["custom_id"].as_str().unwrap();
                assert!(ButtonAction::parse(id).is_some(), "sin acción: {id}");
            }
        }
    }

    #[test]
    fn test_parse_pagination_ids() {
        assert_eq!(ButtonAction::parse("queue_page:3"), Some(ButtonAction::QueuePage(3)));
        assert_eq!(
            ButtonAction::parse("playlist_page:1"),
            Some(ButtonAction::PlaylistPage(1))
        );
        assert_eq!(ButtonAction::parse("queue_page:abc"), None);
        assert_eq!(ButtonAction::parse("other_page:2"), None);
        assert_eq!(ButtonAction::parse("queue_page_info"), None);
    }

    #[test]
    fn test_pagination_ids_point_to_neighbours() {
        let row = pagination_buttons(button_ids::QUEUE_PAGE, 2, 3);
        let json = serde_json::to_value(&row).unwrap();
        let ids: Vec<_> = json["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["custom_id"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["queue_page:1", "queue_page_info", "queue_page:3"]);
    }
}
