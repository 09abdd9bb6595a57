//! Nested Routes Demo
//!
//! Demonstrates a layout route wrapping its children through `next()`,
//! parameter capture, named routes and a fallback page for unknown paths.
//!
//! Run with `RUST_LOG=trace` to watch every match attempt.

use tree_navigator::*;

#[derive(Debug, Default)]
struct Session {
    user: Option<String>,
}

type Page = String;

fn routes() -> Vec<Route<Session, Page>> {
    vec![
        // Layout: renders whatever the matched child produces
        Route::new("/", |ctx: RouteContext<Session, Page>| async move {
            let inner = ctx.next().await?.unwrap_or_default();
            Ok::<_, ResolveError>(Some(format!("<app>{}</app>", inner)))
        })
        .children(vec![
            Route::new("home", |ctx: RouteContext<Session, Page>| {
                let user = ctx.context().user.clone().unwrap_or_else(|| "guest".into());
                async move { Ok(Some(format!("welcome, {}", user))) }
            })
            .name("home"),
            // Group without an action: resolution passes straight to its children
            Route::group("users").children(vec![
                Route::new(":id(\\d+)", |ctx: RouteContext<Session, Page>| {
                    let id = ctx.param("id").unwrap_or_default().to_string();
                    async move { Ok(Some(format!("user #{}", id))) }
                })
                .name("user"),
                Route::new(":id(\\d+)/posts/:post?", |ctx: RouteContext<Session, Page>| {
                    let post = ctx.param("post").unwrap_or("all").to_string();
                    async move { Ok(Some(format!("posts: {}", post))) }
                })
                .name("user.posts"),
            ]),
        ]),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = RouterOptions::new().error_handler(|path, error, _ctx: &Session| {
        let page = format!("<app>{} ({})</app>", error, path);
        async move { Ok(Some(page)) }
    });
    let router = Router::with_options(routes(), options)?;

    println!("Compiled {} routes:", router.len());
    for node in router.iter() {
        println!("  {:<28} {}", node.pattern().source(), node.pattern().as_regex());
    }

    let session = || Session {
        user: Some("ada".to_string()),
    };
    for path in ["/home", "/users/42", "/users/42/posts", "/users/42/posts/7", "/missing"] {
        let page = router.resolve(path, session()).await?;
        println!("{:<20} => {}", path, page.unwrap_or_default());
    }

    // Generate a path back from a route name, then resolve it
    let params = RouteParams::new().with("id", "7").with("post", "hello world");
    let url = router.url_for("user.posts", &params)?;
    let page = router.resolve(url.as_str(), Session::default()).await?;
    println!("{:<20} => {}", url, page.unwrap_or_default());

    Ok(())
}
