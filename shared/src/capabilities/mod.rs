mod http;

pub use self::http::{
    HttpError, HttpMethod, ResourceRequest, UsersEndpoint, ValidatedUrl, MAX_URL_LENGTH,
};

// Render capability: we use Crux's built-in Render directly to ask the shell
// for a redraw.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
#[allow(unused_imports)]
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
