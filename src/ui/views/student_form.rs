use crate::api::{
  ApiError, FieldErrors, FormField, Gender, Student, StudentForm, StudentId, StudentPatch,
};
use crate::app::AppContext;
use crate::mutation::Mutation;
use crate::query::Query;
use crate::router::{FormMode, Route};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::avatar_label;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const LABEL_WIDTH: usize = 16;

/// Add/edit form for a single student.
///
/// In edit mode the record is loaded once into local state; later cache
/// updates do not overwrite what the user is typing.
pub struct StudentFormView {
  ctx: AppContext,
  mode: FormMode,
  inputs: Vec<(FormField, TextInput)>,
  gender: Gender,
  // Index into FormField::all(); one past the end is the submit button
  focus: usize,
  record: Option<Query<Student>>,
  loaded: bool,
  create: Mutation<StudentForm, Student, ApiError>,
  update: Mutation<(StudentId, StudentForm), Student, ApiError>,
  field_errors: FieldErrors,
  submit_error: Option<String>,
}

impl StudentFormView {
  pub fn new(ctx: AppContext, mode: FormMode) -> Self {
    let inputs = FormField::all()
      .iter()
      .filter(|f| **f != FormField::Gender)
      .map(|f| (*f, TextInput::new()))
      .collect();

    let record = match &mode {
      FormMode::Create => None,
      FormMode::Edit(id) => {
        let api = ctx.api.clone();
        let id = id.clone();
        let mut query = Query::new(move || {
          let api = api.clone();
          let id = id.clone();
          async move { api.get_student(&id).await.map_err(|e| e.to_string()) }
        });
        query.fetch();
        Some(query)
      }
    };

    let api = ctx.api.clone();
    let create = Mutation::new(move |form: StudentForm| {
      let api = api.clone();
      async move { api.add_student(&form).await }
    });

    let api = ctx.api.clone();
    let update = Mutation::new(move |(id, form): (StudentId, StudentForm)| {
      let api = api.clone();
      async move { api.update_student(&id, &StudentPatch::from(form)).await }
    });

    let mut view = Self {
      ctx,
      mode,
      inputs,
      gender: Gender::default(),
      focus: 0,
      record,
      loaded: false,
      create,
      update,
      field_errors: FieldErrors::new(),
      submit_error: None,
    };

    // A prefetched record fills the form before the first frame
    if let FormMode::Edit(id) = &view.mode {
      if let Some(student) = view.ctx.api.cached_student(id) {
        view.fill(&StudentForm::from(student));
        view.loaded = true;
      }
    }

    view
  }

  fn current_form(&self) -> StudentForm {
    let mut form = StudentForm {
      gender: self.gender,
      ..StudentForm::default()
    };
    for (field, input) in &self.inputs {
      form.set(*field, input.value());
    }
    form
  }

  fn fill(&mut self, form: &StudentForm) {
    for (field, input) in &mut self.inputs {
      input.set_value(form.value(*field));
    }
    self.gender = form.gender;
  }

  fn submit_index() -> usize {
    FormField::all().len()
  }

  fn focused_field(&self) -> Option<FormField> {
    FormField::all().get(self.focus).copied()
  }

  fn focused_input(&mut self) -> Option<&mut TextInput> {
    let field = self.focused_field()?;
    self
      .inputs
      .iter_mut()
      .find(|(f, _)| *f == field)
      .map(|(_, input)| input)
  }

  fn move_focus(&mut self, delta: isize) {
    let slots = Self::submit_index() as isize + 1;
    self.focus = (self.focus as isize + delta).rem_euclid(slots) as usize;
  }

  fn is_pending(&self) -> bool {
    match self.mode {
      FormMode::Create => self.create.is_pending(),
      FormMode::Edit(_) => self.update.is_pending(),
    }
  }

  fn is_loading_record(&self) -> bool {
    self.record.as_ref().is_some_and(|r| r.is_loading())
  }

  /// Any edit hides the errors of the last submission
  fn on_change(&mut self) {
    self.field_errors = FieldErrors::new();
    self.submit_error = None;
    if !self.is_pending() {
      self.create.reset();
      self.update.reset();
    }
  }

  fn submit(&mut self) {
    if self.is_pending() {
      return;
    }

    let form = self.current_form();
    let missing = form.missing_fields();
    if !missing.is_empty() {
      tracing::debug!(missing = missing.len(), "form incomplete");
      self.field_errors = missing;
      self.submit_error = None;
      return;
    }

    self.on_change();
    match &self.mode {
      FormMode::Create => self.create.mutate(form),
      FormMode::Edit(id) => self.update.mutate((id.clone(), form)),
    }
  }

  fn show_error(&mut self, error: ApiError) {
    let errors = error.field_errors().cloned().unwrap_or_default();
    let unshown: Vec<String> = errors
      .iter()
      .filter(|(field, _)| FormField::from_name(field).is_none())
      .map(|(field, message)| format!("{}: {}", field, message))
      .collect();

    if !errors.is_empty() && unshown.len() < errors.len() {
      tracing::debug!(fields = errors.len(), "server rejected form");
      self.field_errors = errors;
      // Messages for fields without a row go on the error line
      self.submit_error = (!unshown.is_empty()).then(|| unshown.join(", "));
      return;
    }

    tracing::warn!(error = %error, status = ?error.status(), "saving student failed");
    let message = if unshown.is_empty() {
      error.to_string()
    } else {
      format!("{} ({})", error, unshown.join(", "))
    };
    self.ctx.notifier.error(format!("Save failed: {}", message));
    self.field_errors = FieldErrors::new();
    self.submit_error = Some(message);
  }

  fn handle_field_key(&mut self, key: KeyEvent) {
    match self.focused_field() {
      Some(FormField::Gender) => {
        let delta = match key.code {
          KeyCode::Left | KeyCode::Char('h') => -1,
          KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => 1,
          _ => return,
        };
        self.gender = self.gender.cycle(delta);
        self.on_change();
      }
      Some(_) => {
        let changed = match self.focused_input() {
          Some(input) => input.handle_key(key) == InputResult::Consumed,
          None => false,
        };
        if changed {
          self.on_change();
        }
      }
      None => {}
    }
  }

  fn title(&self) -> String {
    let mut title = match &self.mode {
      FormMode::Create => " Add Student ".to_string(),
      FormMode::Edit(id) => format!(" Edit Student #{} ", id),
    };
    if self.is_loading_record() && !self.loaded {
      title.push_str("(loading...) ");
    }
    if let Some(e) = self.record.as_ref().and_then(|r| r.error()) {
      title.push_str(&format!("(error: {}) ", e));
    }
    if self.is_pending() {
      title.push_str("(saving...) ");
    }
    title
  }

  fn field_line(&self, index: usize, field: FormField) -> Line<'static> {
    let focused = self.focus == index;
    let marker = if focused { "> " } else { "  " };
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    let required = if field.is_required() { "*" } else { " " };

    let mut spans = vec![
      Span::styled(marker, Style::default().fg(Color::Cyan)),
      Span::styled(
        format!("{:<width$}", field.label(), width = LABEL_WIDTH),
        label_style,
      ),
      Span::styled(required, Style::default().fg(Color::DarkGray)),
      Span::raw(" "),
    ];

    if field == FormField::Gender {
      for gender in Gender::all() {
        let (mark, style) = if *gender == self.gender {
          ("(•)", Style::default().fg(Color::Yellow).bold())
        } else {
          ("( )", Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(format!("{} {}  ", mark, gender.label()), style));
      }
    } else if let Some((_, input)) = self.inputs.iter().find(|(f, _)| *f == field) {
      if focused {
        let (before, after) = input.split_at_cursor();
        let mut rest = after.chars();
        let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
        spans.push(Span::raw(before.to_string()));
        spans.push(Span::styled(
          under,
          Style::default().add_modifier(Modifier::REVERSED),
        ));
        spans.push(Span::raw(rest.as_str().to_string()));
      } else if input.is_empty() {
        spans.push(Span::styled("—", Style::default().fg(Color::DarkGray)));
      } else {
        spans.push(Span::raw(input.value().to_string()));
      }

      if field == FormField::Avatar && !input.is_empty() {
        spans.push(Span::styled(
          format!("  ({})", avatar_label(input.value())),
          Style::default().fg(Color::DarkGray),
        ));
      }
    }

    if let Some(message) = self.field_errors.get(field.name()) {
      spans.push(Span::styled(
        format!("  ✗ {}", message),
        Style::default().fg(Color::Red).bold(),
      ));
    }

    Line::from(spans)
  }

  fn submit_line(&self) -> Line<'static> {
    let label = match (&self.mode, self.is_pending()) {
      (_, true) => "[ Saving... ]",
      (FormMode::Create, false) => "[ Add student ]",
      (FormMode::Edit(_), false) => "[ Save changes ]",
    };
    let style = if self.is_pending() {
      Style::default().fg(Color::DarkGray)
    } else if self.focus == Self::submit_index() {
      Style::default().fg(Color::Black).bg(Color::Green).bold()
    } else {
      Style::default().fg(Color::Green)
    };
    Line::from(vec![Span::raw(" ".repeat(LABEL_WIDTH + 4)), Span::styled(label, style)])
  }
}

impl View for StudentFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => return ViewAction::Back,
      KeyCode::Char('s') if ctrl => self.submit(),
      KeyCode::Tab | KeyCode::Down => self.move_focus(1),
      KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
      KeyCode::Enter => {
        if self.focus == Self::submit_index() {
          self.submit();
        } else {
          self.move_focus(1);
        }
      }
      _ => self.handle_field_key(key),
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines = vec![Line::default()];
    for (index, field) in FormField::all().iter().enumerate() {
      lines.push(self.field_line(index, *field));
    }
    lines.push(Line::default());
    lines.push(self.submit_line());

    if let Some(error) = &self.submit_error {
      lines.push(Line::default());
      lines.push(Line::styled(
        format!("  Error: {}", error),
        Style::default().fg(Color::Red),
      ));
    }

    lines.push(Line::default());
    lines.push(Line::styled(
      "  Tab/↑↓ move · ←/→ gender · Enter on button or Ctrl-S submit · Esc back",
      Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.mode {
      FormMode::Create => "Add".to_string(),
      FormMode::Edit(id) => format!("Edit #{}", id),
    }
  }

  fn route(&self) -> Route {
    match &self.mode {
      FormMode::Create => Route::StudentAdd,
      FormMode::Edit(id) => Route::StudentEdit { id: id.clone() },
    }
  }

  fn tick(&mut self) {
    let arrived = match &mut self.record {
      Some(record) => {
        if record.poll() {
          record.data().cloned()
        } else {
          None
        }
      }
      None => None,
    };
    if let Some(student) = arrived {
      if !self.loaded {
        self.fill(&StudentForm::from(student));
        self.loaded = true;
      }
    }

    if self.create.poll() {
      if let Some(student) = self.create.data() {
        tracing::info!(id = %student.id, "student added");
        self.ctx.notifier.success("Add Successful!");
        self.fill(&StudentForm::default());
        self.focus = 0;
      } else if let Some(e) = self.create.error().cloned() {
        self.show_error(e);
      }
    }

    if self.update.poll() {
      if let Some(student) = self.update.data().cloned() {
        tracing::info!(id = %student.id, "student updated");
        self.ctx.notifier.success("Update Successful!");
        self.fill(&StudentForm::from(student));
      } else if let Some(e) = self.update.error().cloned() {
        self.show_error(e);
      }
    }
  }

  fn captures_text(&self) -> bool {
    !matches!(self.focused_field(), None | Some(FormField::Gender))
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(20),
      ShortcutInfo::new("ctrl-s", "submit").with_priority(30),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}
