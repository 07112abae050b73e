pub mod block_view;
pub mod command_menu;
pub mod form_content;
pub mod keys;
pub mod text_content;

pub use block_view::BlockView;
pub use command_menu::CommandMenu;
pub use form_content::FormContent;
pub use text_content::{HeadingContent, TextContent};
