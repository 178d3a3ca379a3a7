use yew::prelude::*;
use yew_router::prelude::*;
use log::info;

mod config;
mod error;
mod dom;
mod animator;
mod viewport;
mod layout;
mod countdown;
mod sticky_header;
mod accordion;
mod toast;
mod popup;
mod reveal;
mod images;
mod intro;
mod app;
mod pages {
    pub mod landing;
    pub mod wheel;
    pub mod content;
}

use pages::{
    landing::Landing,
    wheel::Wheel,
    content::{Content, NotFound},
};


#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/wheel")]
    Wheel,
    #[at("/content")]
    Content,
    #[not_found]
    #[at("/404")]
    NotFound,
}


fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => {
            info!("Rendering Landing page");
            html! { <Landing /> }
        },
        Route::Wheel => {
            info!("Rendering Wheel page");
            html! { <Wheel /> }
        },
        Route::Content => {
            info!("Rendering Content page");
            html! { <Content /> }
        },
        Route::NotFound => {
            info!("Rendering NotFound page");
            html! { <NotFound /> }
        },
    }
}


#[function_component(Nav)]
pub fn nav() -> Html {
    html! {
        <nav class="top-nav">
            <div class="nav-content">
                <Link<Route> to={Route::Home} classes="nav-link">
                    {"Prizes"}
                </Link<Route>>
                <Link<Route> to={Route::Wheel} classes="nav-link">
                    {"Prize wheel"}
                </Link<Route>>
            </div>
        </nav>
    }
}


#[function_component]
fn App() -> Html {
    html! {
        <BrowserRouter>
            <Nav />
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}


fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(config::log_level()) {
        gloo_console::error!(format!("error initializing log: {}", e));
    }

    info!("Starting application");
    yew::Renderer::<App>::new().render();
}
