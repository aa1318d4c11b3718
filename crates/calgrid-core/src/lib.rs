pub mod bucket;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod event;
pub mod form;
pub mod grid;
pub mod layout;
pub mod navigation;
pub mod render;
pub mod storage;
pub mod store;

use std::ffi::OsString;

use anyhow::{
  Context,
  anyhow
};
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::{
  Calendar,
  CalendarOptions,
  EventChange
};
use crate::cli::{
  Command,
  EventArgs
};
use crate::form::EventForm;
use crate::navigation::ViewMode;
use crate::render::Renderer;
use crate::storage::FileStore;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting calgrid"
  );

  let mut cfg = config::Config::load(
    cli.calrc.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let data_dir = cfg
    .data_dir(cli.data.as_deref())
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    FileStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open storage at {}",
          data_dir.display()
        )
      })?;

  let mut calendar = Calendar::open(
    storage,
    CalendarOptions {
      initial_view: cfg.initial_view(),
      storage_key: cfg.storage_key(),
      hour_height: cfg.hour_height(),
      ..CalendarOptions::default()
    }
  );
  calendar.subscribe(
    |change: &EventChange| {
      match change {
        | EventChange::Added(event) => {
          info!(id = %event.id, "event added")
        }
        | EventChange::Updated {
          id,
          ..
        } => {
          info!(id = %id, "event updated")
        }
        | EventChange::Deleted { id } => {
          info!(id = %id, "event deleted")
        }
      }
    }
  );

  let renderer = Renderer::new(&cfg)?;
  dispatch(
    &mut calendar,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}

#[tracing::instrument(skip(
  calendar, renderer
))]
fn dispatch(
  calendar: &mut Calendar<FileStore>,
  renderer: &Renderer,
  command: Command
) -> anyhow::Result<()> {
  match command {
    | Command::Month { date } => {
      if let Some(raw) = date {
        calendar
          .navigation_mut()
          .set_anchor(
            datetime::parse_date(&raw)?
          );
      }
      calendar.set_view(ViewMode::Month);
      renderer
        .print_month(&calendar.month_view())
    }
    | Command::Week { date } => {
      if let Some(raw) = date {
        calendar
          .navigation_mut()
          .set_anchor(
            datetime::parse_date(&raw)?
          );
      }
      calendar.set_view(ViewMode::Week);
      renderer
        .print_week(&calendar.week_view())
    }
    | Command::List => {
      renderer
        .print_events(calendar.events())
    }
    | Command::Add(fields) => {
      let raw_start =
        fields.start.clone().ok_or_else(
          || anyhow!("--start is required")
        )?;
      let start =
        datetime::parse_datetime_local(
          &raw_start
        )?;
      let mut form =
        EventForm::blank(start);
      fill_form(&mut form, fields);
      let change =
        calendar.submit(&form)?;
      if let EventChange::Added(event) =
        &change
      {
        println!(
          "Created event {}",
          event.id
        );
      }
      Ok(())
    }
    | Command::Edit { id, fields } => {
      let Some(mut form) =
        calendar.edit_form(&id)
      else {
        warn!(id = %id, "edit for unknown event ignored");
        println!("No event {id}");
        return Ok(());
      };
      fill_form(&mut form, fields);
      calendar.submit(&form)?;
      println!("Updated event {id}");
      Ok(())
    }
    | Command::Delete { id } => {
      if calendar.delete(&id) {
        println!("Deleted event {id}");
      } else {
        println!("No event {id}");
      }
      Ok(())
    }
    | Command::Slot {
      date,
      y,
      scroll
    } => {
      let day =
        datetime::parse_date(&date)?;
      let at = calendar
        .slot_at(day, y, 0.0, scroll);
      debug!(%day, y, scroll, %at, "resolved slot");
      println!(
        "{}",
        datetime::to_datetime_local(&at)
      );
      Ok(())
    }
  }
}

fn fill_form(
  form: &mut EventForm,
  fields: EventArgs
) {
  if let Some(title) = fields.title {
    form.title = title;
  }
  if let Some(start) = fields.start {
    form.start = start;
  }
  if let Some(end) = fields.end {
    form.end = end;
  }
  if let Some(color) = fields.color {
    form.color = color;
  }
  if let Some(description) =
    fields.description
  {
    form.description = description;
  }
  if let Some(category) =
    fields.category
  {
    form.category = Some(category);
  }
}
