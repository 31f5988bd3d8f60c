//! Capability set exposed to the app. The derive generates the [`Effect`]
//! enum the shell executes.

use crux_core::render::Render;
use crux_http::Http;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
}
