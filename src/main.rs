//! Entry point for the redirect countdown page.

use redirect_countdown::components::CountdownCard;
use redirect_countdown::hooks::use_countdown;
use redirect_countdown::{logging, web};
use yew::prelude::*;

/// Page root: loads the configuration once and runs the countdown.
#[function_component]
pub fn App() -> Html {
    let config = use_state(web::page_config);
    let countdown = use_countdown(&config);

    html! {
        <main class="container">
            <CountdownCard
                view={countdown.view}
                circumference={config.circle_circumference}
                on_trigger={countdown.trigger}
            />
        </main>
    }
}

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    if let Err(e) = logging::init(logging::default_level()) {
        web_sys::console::warn_1(&format!("Logger already installed: {}", e).into());
    }
    yew::Renderer::<App>::new().render();
}
