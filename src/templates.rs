//! HTML pages.
//!
//! Pages are assembled from plain format strings. Every piece of user
//! supplied text goes through [`escape_html`].

use crate::lists::forms::ItemError;
use crate::lists::views::{MyLists, Page};
use crate::model::{Item, List, User, list_url};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn render(page: &Page, user: Option<&User>) -> String {
    match page {
        Page::Home { form } => {
            let body = item_form("/lists/new", &form.text, form.error);
            layout("Start a new To-Do list", user, &body)
        }
        Page::List { list, items, form } => {
            let mut body = owner_line(list);
            body.push_str(&item_form(&list.url(), &form.text, form.error));
            body.push_str(&item_table(items));
            layout("Your To-Do list", user, &body)
        }
        Page::MyLists(ctx) => layout("My Lists", user, &my_lists_body(ctx)),
    }
}

pub fn not_found() -> String {
    layout("Not found", None, "<p>The page you asked for does not exist.</p>")
}

pub fn server_error() -> String {
    layout("Something went wrong", None, "<p>Please try again later.</p>")
}

fn layout(heading: &str, user: Option<&User>, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
    <head>
        <meta charset="utf-8">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <title>To-Do lists</title>
        <link rel="stylesheet" href="/static/base.css">
    </head>
    <body>
        <nav class="navbar">
            <a class="navbar-brand" href="/">Superlists</a>
            {nav}
        </nav>
        <main class="container">
            <h1>{heading}</h1>
            {body}
        </main>
    </body>
</html>
"#,
        nav = navbar(user),
        heading = escape_html(heading),
        body = body,
    )
}

fn navbar(user: Option<&User>) -> String {
    match user {
        Some(user) => {
            let email = escape_html(&user.email);
            format!(
                r#"<a href="/lists/user/{href}/">My lists</a>
            <span class="navbar-text">Logged in as {email}</span>
            <a href="/accounts/logout">Log out</a>"#,
                href = urlencoding::encode(&user.email),
                email = email,
            )
        }
        None => r#"<form method="POST" action="/accounts/send_login_email">
                <span>Enter email to log in:</span>
                <input class="form-control" name="email" type="email">
            </form>"#
            .to_string(),
    }
}

fn item_form(action: &str, text: &str, error: Option<ItemError>) -> String {
    let (input_class, error_block) = match error {
        Some(e) => (
            "form-control is-invalid",
            format!(
                r#"<div class="has-error"><span class="help-block">{}</span></div>"#,
                escape_html(&e.to_string())
            ),
        ),
        None => ("form-control", String::new()),
    };

    format!(
        r#"<form method="POST" action="{action}">
                <input name="text" id="id_text" class="{input_class}" placeholder="Enter a to-do item" value="{value}" required>
                {error_block}
            </form>
"#,
        action = escape_html(action),
        input_class = input_class,
        value = escape_html(text),
        error_block = error_block,
    )
}

fn owner_line(list: &List) -> String {
    match &list.owner {
        Some(owner) => format!(
            "<p>List owner: <span id=\"id_list_owner\">{}</span></p>\n",
            escape_html(owner)
        ),
        None => String::new(),
    }
}

fn item_table(items: &[Item]) -> String {
    let rows: String = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("<tr><td>{}: {}</td></tr>", i + 1, escape_html(&item.text)))
        .collect();
    format!(r#"<table id="id_list_table" class="table">{}</table>"#, rows)
}

fn my_lists_body(ctx: &MyLists) -> String {
    let mut body = String::new();

    if let Some(message) = &ctx.error_message {
        body.push_str(&format!(r#"<p class="error">{}</p>"#, escape_html(message)));
    }

    if let Some(form) = &ctx.form {
        body.push_str(&item_form(&list_url(form.list_id), &form.text, form.error));
    }

    if let Some(owner) = &ctx.owner {
        body.push_str(&format!("<h3>{}'s lists:</h3>\n<ul>", escape_html(&owner.email)));
        for summary in &ctx.lists {
            body.push_str(&format!(
                r#"<li><a href="{}">{}</a></li>"#,
                summary.list.url(),
                escape_html(&summary.name)
            ));
        }
        body.push_str("</ul>");
    }

    body
}
