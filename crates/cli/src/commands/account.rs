use bugboard_client::views::{AccountView, Registration};

use super::{Context, Friendly};
use crate::output;

fn view(ctx: &Context) -> AccountView {
    AccountView::new(ctx.api.clone(), ctx.bus.clone())
}

pub async fn login(ctx: &Context, username: &str, password: &str) -> anyhow::Result<()> {
    let session = view(ctx).login(username, password).await.friendly("Login failed")?;
    if ctx.json {
        return output::json(&session.user);
    }
    println!("Signed in as {} ({})", session.user.username, session.user.role);
    Ok(())
}

pub fn logout(ctx: &Context) -> anyhow::Result<()> {
    view(ctx).logout().friendly("Logout failed")?;
    println!("Signed out");
    Ok(())
}

pub async fn register(
    ctx: &Context,
    username: String,
    email: String,
    password: String,
    phone: Option<String>,
) -> anyhow::Result<()> {
    let form = Registration {
        username,
        email,
        password,
        phone,
    };
    let user = view(ctx).register(form).await.friendly("Registration failed")?;
    if ctx.json {
        return output::json(&user);
    }
    println!("Account {} created. Sign in with `bugboard login {}`.", user.id, user.username);
    Ok(())
}

pub fn whoami(ctx: &Context) -> anyhow::Result<()> {
    match view(ctx).current_user() {
        Some(user) if ctx.json => output::json(&user),
        Some(user) => {
            output::print_user(&user);
            Ok(())
        }
        None => anyhow::bail!("Not signed in"),
    }
}

pub async fn change_password(ctx: &Context, new: &str, confirm: &str) -> anyhow::Result<()> {
    view(ctx)
        .change_password(new, confirm)
        .await
        .friendly("Failed to change password")?;
    println!("Password changed");
    Ok(())
}

pub async fn delete_account(ctx: &Context, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete the account without --yes");
    }
    view(ctx)
        .delete_account()
        .await
        .friendly("Failed to delete account")?;
    println!("Account deleted");
    Ok(())
}
