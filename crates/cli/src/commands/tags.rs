use super::{Context, Friendly};
use crate::output;

pub async fn list(ctx: &Context) -> anyhow::Result<()> {
    let tags = ctx.api.list_tags().await.friendly("Failed to load tags")?;
    if ctx.json {
        return output::json(&tags);
    }
    for tag in &tags {
        println!("{:>5}  {}", tag.id, tag.name);
    }
    Ok(())
}

pub async fn create(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let tag = ctx.api.create_tag(name).await.friendly("Failed to create tag")?;
    if ctx.json {
        return output::json(&tag);
    }
    println!("Created tag #{} {}", tag.id, tag.name);
    Ok(())
}
