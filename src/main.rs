use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use tef_master::content::{grade_fill_in_blank, ContentGenerator, DEFAULT_LEVEL};
use tef_master::curriculum::{self, resources, syllabus, writing_prompts, CefrLevel};
use tef_master::progress::{
    award_activity_xp, award_question_xp, required_weeks_to_unlock, Activity, JsonProgressStore, ModuleType,
    ProgressStore,
};
use tef_master::{Config, HybridDispatcher, PolicyMode};

fn cli() -> Command {
    let week_arg = Arg::new("week")
        .short('w')
        .long("week")
        .value_name("NUM")
        .help("Syllabus week the exercise counts toward")
        .value_parser(clap::value_parser!(u32))
        .default_value("1");

    let count_arg = Arg::new("count")
        .short('n')
        .long("count")
        .value_name("NUM")
        .help("Number of questions")
        .value_parser(clap::value_parser!(usize))
        .default_value("5");

    let level_arg = Arg::new("level")
        .short('l')
        .long("level")
        .value_name("CEFR")
        .help("Difficulty level (A1, A2, B1, B2)")
        .default_value(DEFAULT_LEVEL);

    Command::new("TEF Master")
        .version("0.1.0")
        .author("TigreRoll")
        .about("TEF French exam preparation with local and cloud AI tutors")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("provider")
                .short('p')
                .long("provider")
                .value_name("POLICY")
                .help("AI provider policy: local, cloud or auto")
                .global(true),
        )
        .arg(
            Arg::new("no-search")
                .long("no-search")
                .help("Disable internet search augmentation")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("status").about("Show configuration and AI connection status"))
        .subcommand(
            Command::new("grammar")
                .about("Explain a grammar topic")
                .arg(Arg::new("topic").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("quiz")
                .about("Interactive fill-in-the-blank quiz on a grammar topic")
                .arg(Arg::new("topic").required(true).num_args(1..))
                .arg(count_arg.clone())
                .arg(week_arg.clone()),
        )
        .subcommand(
            Command::new("check")
                .about("Grade an answer against the expected one (no AI)")
                .arg(Arg::new("answer").required(true))
                .arg(Arg::new("expected").required(true)),
        )
        .subcommand(
            Command::new("article")
                .about("Generate a short reading article")
                .arg(Arg::new("topic").required(true).num_args(1..))
                .arg(level_arg.clone()),
        )
        .subcommand(
            Command::new("questions")
                .about("Interactive comprehension questions on an article file")
                .arg(Arg::new("article-file").required(true).value_parser(clap::value_parser!(PathBuf)))
                .arg(count_arg)
                .arg(week_arg.clone()),
        )
        .subcommand(
            Command::new("grade")
                .about("Grade an essay file")
                .arg(Arg::new("essay-file").required(true).value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    Arg::new("task")
                        .short('t')
                        .long("task")
                        .value_name("TYPE")
                        .help("Task type, e.g. \"Section A - Fait Divers\" or a prompt id such as A_01")
                        .required(true),
                )
                .arg(week_arg.clone()),
        )
        .subcommand(
            Command::new("speaking")
                .about("Generate a speaking question (voice tutor)")
                .arg(level_arg),
        )
        .subcommand(
            Command::new("ask")
                .about("Ask the tutor anything")
                .arg(Arg::new("question").required(true).num_args(1..)),
        )
        .subcommand(Command::new("progress").about("Show XP, streak and unlocked weeks"))
        .subcommand(
            Command::new("syllabus")
                .about("Show the weekly syllabus")
                .arg(Arg::new("level").short('l').long("level").value_name("CEFR"))
                .arg(
                    Arg::new("week")
                        .short('w')
                        .long("week")
                        .value_name("NUM")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("resources")
                .about("Browse study resources")
                .arg(Arg::new("category").short('c').long("category").value_name("NAME"))
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .value_name("QUERY")
                        .conflicts_with("category"),
                ),
        )
        .subcommand(
            Command::new("favorite")
                .about("Manage favorite resources")
                .subcommand_required(true)
                .subcommand(Command::new("add").arg(Arg::new("id").required(true)))
                .subcommand(Command::new("remove").arg(Arg::new("id").required(true)))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("prompts")
                .about("Browse writing prompts")
                .arg(Arg::new("type").short('t').long("type").value_name("TYPE"))
                .arg(Arg::new("id").long("id").value_name("ID").conflicts_with("type")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let filter = if matches.get_flag("verbose") {
        "tef_master=debug,info".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tef_master=info,warn".to_string())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(policy) = matches.get_one::<String>("provider") {
        config.ai.policy = policy.parse::<PolicyMode>()?;
    }
    if matches.get_flag("no-search") {
        config.ai.search_enabled = false;
    }
    config.validate()?;

    let store = JsonProgressStore::open(config.storage.progress_file.clone()).await?;

    match matches.subcommand() {
        Some(("status", _)) => {
            let dispatcher = HybridDispatcher::from_config(&config)?;
            println!("{}", config.summary());
            println!();
            println!("{}", dispatcher.status().await);
        }
        Some(("grammar", sub)) => {
            let dispatcher = HybridDispatcher::from_config(&config)?;
            let generator = ContentGenerator::new(&dispatcher);
            println!("{}", generator.explain_grammar(&joined(sub, "topic")).await);
        }
        Some(("quiz", sub)) => run_quiz(&config, &store, sub).await?,
        Some(("check", sub)) => {
            let answer = required(sub, "answer")?;
            let expected = required(sub, "expected")?;
            let grade = grade_fill_in_blank(answer, expected);
            println!(
                "{} (similarity {:.2})",
                if grade.correct { "✅ Correct" } else { "❌ Incorrect" },
                grade.similarity
            );
        }
        Some(("article", sub)) => {
            let level = parse_level(sub)?;
            let dispatcher = HybridDispatcher::from_config(&config)?;
            let generator = ContentGenerator::new(&dispatcher);
            println!("{}", generator.reading_article(&joined(sub, "topic"), level.as_str()).await);
        }
        Some(("questions", sub)) => run_reading_questions(&config, &store, sub).await?,
        Some(("grade", sub)) => run_essay_grading(&config, &store, sub).await?,
        Some(("speaking", sub)) => {
            if !config.features.voice_tutor {
                return Err(anyhow!(
                    "Voice tutor is disabled. Set features.voice_tutor = true in tef-master.toml"
                ));
            }
            let level = parse_level(sub)?;
            let dispatcher = HybridDispatcher::from_config(&config)?;
            let generator = ContentGenerator::new(&dispatcher);
            println!("🎤 {}", generator.speaking_question(level.as_str()).await);
            award_activity_xp(&store, Activity::VoicePractice, &config.gamification).await?;
        }
        Some(("ask", sub)) => {
            let dispatcher = HybridDispatcher::from_config(&config)?;
            let generator = ContentGenerator::new(&dispatcher);
            let answer = generator.ask_tutor(&joined(sub, "question")).await;
            println!("{}", answer);
            if config.ai.search_enabled && !answer.starts_with("Error:") {
                award_activity_xp(&store, Activity::SearchQuery, &config.gamification).await?;
            }
        }
        Some(("progress", _)) => show_progress(&store).await?,
        Some(("syllabus", sub)) => show_syllabus(&config, &store, sub).await?,
        Some(("resources", sub)) => show_resources(&store, sub).await?,
        Some(("favorite", sub)) => manage_favorites(&store, sub).await?,
        Some(("prompts", sub)) => show_prompts(sub)?,
        _ => return Err(anyhow!("unknown command")),
    }

    Ok(())
}

/// Multi-word positional argument joined back into one string
fn joined(matches: &ArgMatches, name: &str) -> String {
    matches
        .get_many::<String>(name)
        .map(|values| values.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{}>", name))
}

fn parse_level(matches: &ArgMatches) -> Result<CefrLevel> {
    matches
        .get_one::<String>("level")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_LEVEL)
        .parse()
}

fn week_of(matches: &ArgMatches) -> u32 {
    matches.get_one::<u32>("week").copied().unwrap_or(1)
}

/// Stable id for a generated question, used to award XP only once
fn question_id(week: u32, module: ModuleType, text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("w{}-{}-{}", week, module, slug)
}

async fn read_answer(lines: &mut Lines<BufReader<Stdin>>) -> Result<String> {
    Ok(lines.next_line().await?.unwrap_or_default().trim().to_string())
}

async fn ensure_unlocked(store: &JsonProgressStore, week: u32) -> Result<()> {
    if syllabus::week(week).is_none() {
        return Err(anyhow!("week {} is not part of the syllabus", week));
    }
    if !store.is_week_unlocked(week).await? {
        return Err(anyhow!(
            "🔒 Week {} is locked: complete modules in at least {} earlier week(s) first",
            week,
            required_weeks_to_unlock(week)
        ));
    }
    Ok(())
}

fn percent(correct: usize, total: usize) -> Option<u32> {
    (total > 0).then(|| (correct * 100 / total) as u32)
}

async fn run_quiz(config: &Config, store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    let topic = joined(sub, "topic");
    let count = sub.get_one::<usize>("count").copied().unwrap_or(5);
    let week = week_of(sub);
    ensure_unlocked(store, week).await?;

    let dispatcher = HybridDispatcher::from_config(config)?;
    let generator = ContentGenerator::new(&dispatcher);
    let questions = generator.fill_in_blank_questions(&topic, count).await;

    if questions.is_empty() {
        println!("Could not generate questions right now. {}", dispatcher.status().await);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut correct = 0;

    for (index, question) in questions.iter().enumerate() {
        println!("\n{}. {}", index + 1, question.question);
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let answer = read_answer(&mut lines).await?;
        let grade = grade_fill_in_blank(&answer, &question.answer);

        if grade.correct {
            correct += 1;
            println!("✅ Correct!");
            let id = question_id(week, ModuleType::Grammar, &question.question);
            let xp = config.gamification.xp_per_grammar_question;
            if award_question_xp(store, &id, week, ModuleType::Grammar, xp).await? {
                println!("⭐ +{} XP", xp);
            }
        } else {
            println!("❌ Expected: {}", question.answer);
        }
        if !question.explanation.is_empty() {
            println!("   {}", question.explanation);
        }
    }

    println!("\nScore: {}/{}", correct, questions.len());
    store
        .save_progress(week, ModuleType::Grammar, true, percent(correct, questions.len()))
        .await?;
    Ok(())
}

async fn run_reading_questions(config: &Config, store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    let path = sub
        .get_one::<PathBuf>("article-file")
        .ok_or_else(|| anyhow!("missing article file"))?;
    let article = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let count = sub.get_one::<usize>("count").copied().unwrap_or(5);
    let week = week_of(sub);
    ensure_unlocked(store, week).await?;

    let dispatcher = HybridDispatcher::from_config(config)?;
    let generator = ContentGenerator::new(&dispatcher);
    let questions = generator.reading_questions(&article, count).await;

    if questions.is_empty() {
        println!("Could not generate questions right now. {}", dispatcher.status().await);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut correct = 0;

    for (index, question) in questions.iter().enumerate() {
        println!("\n{}. {}", index + 1, question.question);
        for (option_index, option) in question.options.iter().enumerate() {
            println!("   [{}] {}", option_index + 1, option);
        }
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let answer = read_answer(&mut lines).await?;
        let chosen = answer.parse::<usize>().ok().and_then(|n| n.checked_sub(1));

        if chosen == Some(question.correct_index) {
            correct += 1;
            println!("✅ Correct!");
            let id = question_id(week, ModuleType::Reading, &question.question);
            let xp = config.gamification.xp_per_reading_question;
            if award_question_xp(store, &id, week, ModuleType::Reading, xp).await? {
                println!("⭐ +{} XP", xp);
            }
        } else {
            println!("❌ Answer: {}", question.correct_option().unwrap_or("?"));
        }
        if !question.explanation.is_empty() {
            println!("   {}", question.explanation);
        }
    }

    println!("\nScore: {}/{}", correct, questions.len());
    store
        .save_progress(week, ModuleType::Reading, true, percent(correct, questions.len()))
        .await?;
    Ok(())
}

async fn run_essay_grading(config: &Config, store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    let path = sub
        .get_one::<PathBuf>("essay-file")
        .ok_or_else(|| anyhow!("missing essay file"))?;
    let essay = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let task = required(sub, "task")?;
    let week = week_of(sub);
    ensure_unlocked(store, week).await?;

    // A prompt id expands to its full task description
    let task_type = match writing_prompts::prompt_by_id(task) {
        Some(prompt) => format!("{} ({}): {}", prompt.task_type, prompt.topic, prompt.prompt),
        None => task.to_string(),
    };

    let dispatcher = HybridDispatcher::from_config(config)?;
    let generator = ContentGenerator::new(&dispatcher);
    let grade = generator.grade_essay(&essay, &task_type).await;

    println!("📝 Total: {}/450", grade.total_score);
    println!("   Structure:  {}/150  {}", grade.structure_score, grade.structure_feedback);
    println!("   Vocabulary: {}/150  {}", grade.vocabulary_score, grade.vocabulary_feedback);
    println!("   Grammar:    {}/150  {}", grade.grammar_score, grade.grammar_feedback);
    for suggestion in &grade.suggestions {
        println!("   • {}", suggestion);
    }

    if grade.total_score > 0 {
        award_activity_xp(store, Activity::WritingSubmission, &config.gamification).await?;
        store
            .save_progress(week, ModuleType::Writing, true, Some(grade.total_score))
            .await?;
    }
    Ok(())
}

async fn show_progress(store: &JsonProgressStore) -> Result<()> {
    let streak = store.streak().await?;
    println!("⭐ Total XP: {}", store.total_xp().await?);
    println!("📅 Today: {} XP", store.daily_xp().await?);
    println!("🔥 Streak: {} day(s) (best {})", streak.current, streak.best);
    if let Some(last) = streak.last_activity {
        let idle = Local::now().date_naive().signed_duration_since(last).num_days();
        if idle > 1 {
            println!("   Last activity {} days ago", idle);
        }
    }

    let mut unlocked = 0;
    let mut completed_weeks = 0;
    for week in curriculum::SYLLABUS {
        if store.is_week_unlocked(week.week).await? {
            unlocked += 1;
        }
        if store.week_progress(week.week).await?.total_completed > 0 {
            completed_weeks += 1;
        }
    }
    println!(
        "📚 Weeks unlocked: {}/{} ({} with completed modules)",
        unlocked,
        syllabus::total_weeks(),
        completed_weeks
    );
    Ok(())
}

async fn show_syllabus(config: &Config, store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    if let Some(number) = sub.get_one::<u32>("week") {
        let week = syllabus::week(*number).ok_or_else(|| anyhow!("no week {}", number))?;
        let progress = store.week_progress(week.week).await?;
        println!("Week {} [{}] {} ({} XP)", week.week, week.level, week.title, week.xp_value);
        println!("  Grammar:    {}", week.grammar_topics.join(", "));
        println!("  Vocabulary: {}", week.vocabulary_themes.join(", "));
        println!("  Reading:    {}", week.reading_topics.join(", "));
        println!("  Writing:    {}", week.writing_tasks.join(", "));
        println!(
            "  Done: grammar {} · reading {} · writing {}",
            tick(progress.grammar),
            tick(progress.reading),
            tick(progress.writing)
        );
        println!(
            "  Target: {} questions before moving on",
            config.gamification.questions_to_unlock_week
        );
        return Ok(());
    }

    let weeks = match sub.get_one::<String>("level") {
        Some(level) => syllabus::weeks_for_level(level.parse()?),
        None => curriculum::SYLLABUS.iter().collect(),
    };

    for week in weeks {
        let lock = if store.is_week_unlocked(week.week).await? { "  " } else { "🔒" };
        let done = store.week_progress(week.week).await?.total_completed;
        println!("{} Week {:>2} [{}] {} ({}/3 modules)", lock, week.week, week.level, week.title, done.min(3));
    }
    Ok(())
}

fn tick(done: bool) -> &'static str {
    if done {
        "✅"
    } else {
        "⬜"
    }
}

async fn show_resources(store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    let listed = if let Some(category) = sub.get_one::<String>("category") {
        resources::resources_in_category(category)
    } else if let Some(query) = sub.get_one::<String>("search") {
        resources::search_resources(query)
    } else {
        resources::all_resources().iter().collect()
    };

    if listed.is_empty() {
        println!("No resources found. Categories: {}", resources::categories().join(", "));
        return Ok(());
    }

    let favorites = store.favorites().await?;
    for resource in listed {
        let star = if favorites.iter().any(|f| f == resource.id) { "★" } else { " " };
        println!("{} [{}] {} ({})", star, resource.id, resource.title, resource.category);
        println!("    {}", resource.url);
        println!("    {}", resource.description);
    }
    Ok(())
}

async fn manage_favorites(store: &JsonProgressStore, sub: &ArgMatches) -> Result<()> {
    match sub.subcommand() {
        Some(("add", args)) => {
            let id = required(args, "id")?;
            let resource = resources::resource_by_id(id).ok_or_else(|| anyhow!("unknown resource id '{}'", id))?;
            store.add_favorite(id).await?;
            info!("★ Added {} to favorites", resource.title);
            println!("★ {}", resource.title);
        }
        Some(("remove", args)) => {
            let id = required(args, "id")?;
            store.remove_favorite(id).await?;
            println!("Removed {}", id);
        }
        Some(("list", _)) => {
            for id in store.favorites().await? {
                match resources::resource_by_id(&id) {
                    Some(resource) => println!("★ [{}] {} {}", id, resource.title, resource.url),
                    None => println!("★ [{}] (no longer in the directory)", id),
                }
            }
        }
        _ => return Err(anyhow!("unknown command")),
    }
    Ok(())
}

fn show_prompts(sub: &ArgMatches) -> Result<()> {
    if let Some(id) = sub.get_one::<String>("id") {
        let prompt = writing_prompts::prompt_by_id(id).ok_or_else(|| anyhow!("unknown prompt id '{}'", id))?;
        println!("[{}] {} - {}", prompt.id, prompt.task_type, prompt.topic);
        println!("{}", prompt.prompt);
        println!("Minimum words: {}", prompt.word_count);
        if let Some(structure) = prompt.structure {
            println!("Format: {}", structure);
        }
        println!("Focus: {}", prompt.grammar_focus.join(", "));
        println!("Key points: {}", prompt.key_points.join(", "));
        println!("Hints: {}", prompt.structure_hints);
        return Ok(());
    }

    let listed = match sub.get_one::<String>("type") {
        Some(task_type) => writing_prompts::prompts_by_type(task_type),
        None => writing_prompts::all_prompts().iter().collect(),
    };

    for prompt in listed {
        println!("[{}] {} - {} ({} words)", prompt.id, prompt.task_type, prompt.topic, prompt.word_count);
    }

    if let Some(today) = writing_prompts::prompt_of_the_day(None, Local::now().date_naive()) {
        println!("\nPrompt of the day: [{}] {}", today.id, today.prompt);
    }
    Ok(())
}
