pub mod header;
pub mod help_overlay;
pub mod players_panel;
pub mod playlist_panel;
