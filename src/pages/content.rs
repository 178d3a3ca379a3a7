use yew::prelude::*;

#[function_component(Content)]
pub fn content() -> Html {
    html! {
        <div class="content-page">
            <h1>{"Congratulations!"}</h1>
            <p>{"Your prize is reserved. Details will be sent with your confirmation."}</p>
            <a href="/">{"Back to the offer"}</a>
        </div>
    }
}

#[function_component(NotFound)]
pub fn not_found() -> Html {
    html! {
        <div class="content-page">
            <h1>{"Page not found"}</h1>
            <a href="/">{"Back to the offer"}</a>
        </div>
    }
}
