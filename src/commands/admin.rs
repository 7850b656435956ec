// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Admin command - CRUD on the hosted backend table

use super::AppContext;
use crate::client::{AdminClient, RegulationForm};
use crate::render;
use anyhow::{bail, Context, Result};
use tracing::info;

/// Admin actions
#[derive(Debug, Clone, clap::Subcommand)]
pub enum AdminAction {
    /// List rows, optionally filtered by title
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page
        #[arg(long, default_value_t = 10)]
        per_page: u32,

        /// Case-insensitive title filter
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one row
    Show {
        /// Row id
        id: i64,
    },

    /// Create a row
    Create(FormArgs),

    /// Update a row; unset fields keep their stored value
    Update {
        /// Row id
        id: i64,

        #[command(flatten)]
        form: FormArgs,
    },

    /// Delete a row
    Delete {
        /// Row id
        id: i64,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Form fields; every field is optional on the command line
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FormArgs {
    /// Title
    #[arg(long)]
    pub titulo: Option<String>,
    /// Normative scale code
    #[arg(long)]
    pub escala_normativa: Option<String>,
    /// Territorial scope code (COM, EST, CCAA, MUN)
    #[arg(long)]
    pub ambito: Option<String>,
    /// Autonomous community
    #[arg(long)]
    pub ccaa: Option<String>,
    /// Province
    #[arg(long)]
    pub provincia: Option<String>,
    /// Municipality
    #[arg(long)]
    pub ciudad: Option<String>,
    /// Source URL
    #[arg(long)]
    pub url: Option<String>,
    /// Economic sustainability codes
    #[arg(long)]
    pub sostenibilidad_economica: Option<String>,
    /// Social sustainability codes
    #[arg(long)]
    pub sostenibilidad_social: Option<String>,
    /// Environmental sustainability codes
    #[arg(long)]
    pub sostenibilidad_ambiental: Option<String>,
    /// Climate change codes
    #[arg(long)]
    pub cambio_climatico: Option<String>,
    /// Urban governance codes
    #[arg(long)]
    pub gobernanza_urbana: Option<String>,
}

impl FormArgs {
    /// Overlay the given fields on `form`
    #[must_use]
    pub fn apply_to(&self, mut form: RegulationForm) -> RegulationForm {
        for (value, field) in [
            (&self.titulo, &mut form.titulo),
            (&self.escala_normativa, &mut form.escala_normativa),
            (&self.ambito, &mut form.ambito),
            (&self.ccaa, &mut form.ccaa),
            (&self.provincia, &mut form.provincia),
            (&self.ciudad, &mut form.ciudad),
            (&self.url, &mut form.url),
            (&self.sostenibilidad_economica, &mut form.sostenibilidad_economica),
            (&self.sostenibilidad_social, &mut form.sostenibilidad_social),
            (&self.sostenibilidad_ambiental, &mut form.sostenibilidad_ambiental),
            (&self.cambio_climatico, &mut form.cambio_climatico),
            (&self.gobernanza_urbana, &mut form.gobernanza_urbana),
        ] {
            if let Some(value) = value {
                value.trim().clone_into(field);
            }
        }
        form
    }
}

/// Run an admin action
pub async fn run(ctx: &AppContext, action: &AdminAction) -> Result<()> {
    let admin = AdminClient::from_config(&ctx.config)
        .context("Admin commands need backend_url and backend_key")?;
    let reference = ctx.reference();

    match action {
        AdminAction::List { page, per_page, search } => {
            let listing = admin
                .list(*page, (*per_page).max(1), search.as_deref())
                .await
                .context("Failed to list regulations")?;
            if ctx.json {
                return ctx.print_json(&listing.regulations);
            }
            let total = listing
                .total
                .map_or_else(|| "?".to_string(), |t| t.to_string());
            println!("{}", ctx.heading(&format!("Página {page} ({total} registros)")));
            for regulation in &listing.regulations {
                println!("{}", render::regulation_row(regulation, &reference));
            }
        }
        AdminAction::Show { id } => {
            let regulation = admin
                .get(*id)
                .await
                .with_context(|| format!("Failed to fetch regulation {id}"))?;
            if ctx.json {
                return ctx.print_json(&regulation);
            }
            print!("{}", render::regulation_detail(&regulation, &reference));
        }
        AdminAction::Create(form) => {
            let form = form.apply_to(RegulationForm::default());
            let created = admin.insert(&form).await.context("Failed to create regulation")?;
            info!(id = %created.id, "created");
            if ctx.json {
                return ctx.print_json(&created);
            }
            println!("Normativa creada: {}", created.id);
        }
        AdminAction::Update { id, form } => {
            let current = admin
                .get(*id)
                .await
                .with_context(|| format!("Failed to fetch regulation {id}"))?;
            let form = form.apply_to(RegulationForm::from_regulation(&current));
            let updated = admin
                .update(*id, &form)
                .await
                .with_context(|| format!("Failed to update regulation {id}"))?;
            if ctx.json {
                return ctx.print_json(&updated);
            }
            println!("Normativa actualizada: {}", updated.id);
        }
        AdminAction::Delete { id, yes } => {
            if !yes {
                bail!("Refusing to delete regulation {id} without --yes");
            }
            admin
                .delete(*id)
                .await
                .with_context(|| format!("Failed to delete regulation {id}"))?;
            println!("Normativa eliminada: {id}");
        }
    }
    Ok(())
}
