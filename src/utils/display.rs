//! Display and output formatting utilities

use crate::level::{Coord, Direction, LevelDescription};
use crate::theory::Solution;
use itertools::Itertools;
use std::collections::HashMap;

/// Format levels and solutions for display
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// Render the board with north at the top.
    ///
    /// `E`/`X` entrance and exit, `#` obstacle, lowercase letters aliens,
    /// uppercase letters houses (by color), arrows rails (by output), `.` empty.
    pub fn format_level(level: &LevelDescription) -> String {
        Self::render(level, &HashMap::new())
    }

    /// Render the board with the rail outputs chosen by a solution
    pub fn format_board(level: &LevelDescription, solution: &Solution) -> String {
        let outputs = solution
            .rail_path()
            .iter()
            .filter_map(|step| step.output.map(|d| (step.coord, d)))
            .collect();
        Self::render(level, &outputs)
    }

    fn render(level: &LevelDescription, outputs: &HashMap<Coord, Direction>) -> String {
        let mut cells: HashMap<Coord, char> = HashMap::new();
        for entrance in &level.entrances {
            cells.insert(*entrance, 'E');
        }
        for exit in &level.exits {
            cells.insert(*exit, 'X');
        }
        for obstacle in &level.obstacles {
            cells.insert(*obstacle, '#');
        }
        for alien in &level.aliens {
            cells.insert(alien.coord, Self::color_letter(alien.color, false));
        }
        for house in &level.houses {
            cells.insert(house.coord, Self::color_letter(house.color, true));
        }
        for rail in &level.rails {
            cells.insert(rail.coord, Self::arrow(rail.output));
        }
        for (coord, direction) in outputs {
            cells.insert(*coord, Self::arrow(*direction));
        }

        let mut output = String::new();
        for row in (0..level.rows).rev() {
            for col in 0..level.cols {
                output.push(cells.get(&Coord::new(col, row)).copied().unwrap_or('.'));
            }
            output.push('\n');
        }
        output
    }

    fn arrow(direction: Direction) -> char {
        match direction {
            Direction::North => '↑',
            Direction::East => '→',
            Direction::South => '↓',
            Direction::West => '←',
        }
    }

    fn color_letter(color: usize, upper: bool) -> char {
        let base = if upper { b'A' } else { b'a' };
        u8::try_from(color % 26).map(|c| char::from(base + c)).unwrap_or('?')
    }

    /// Format a solution: board, rail path with cargo, satisfied cells
    pub fn format_solution(level: &LevelDescription, solution: &Solution) -> String {
        let mut output = String::new();

        output.push_str(&Self::format_board(level, solution));
        output.push('\n');

        output.push_str(&format!(
            "Rail path ({} rails, {}):\n",
            solution.rail_path().len(),
            if solution.is_complete() { "reaches the exit" } else { "incomplete" }
        ));
        for step in solution.rail_path() {
            let side = |d: Option<Direction>| d.map(|d| d.letter()).unwrap_or('?');
            let cargo = match step.cargo {
                Some(color) => format!("carrying {color}"),
                None => "empty".to_string(),
            };
            output.push_str(&format!(
                "  {} {}→{} {}\n",
                step.coord,
                side(step.input),
                side(step.output),
                cargo
            ));
        }

        let list = |cells: &[Coord]| -> String {
            if cells.is_empty() {
                "none".to_string()
            } else {
                cells.iter().join(", ")
            }
        };
        output.push_str(&format!("Satisfied aliens: {}\n", list(&solution.satisfied_aliens)));
        output.push_str(&format!("Satisfied houses: {}\n", list(&solution.satisfied_houses)));

        output
    }

    /// Format the true propositions of a solution, grouped by name
    pub fn format_groups(solution: &Solution) -> String {
        let mut output = String::new();
        for (name, keys) in &solution.groups {
            output.push_str(&format!("{name}: {}\n", keys.join(" ")));
        }
        output
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() &&
        (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::io::example_levels;

    #[test]
    fn test_level_rendering() {
        let (_, delivery) = example_levels().remove(2);
        let board = SolutionFormatter::format_level(&delivery);
        assert_eq!(board, ".....\nE→→→X\n.a.A.\n");
    }

    #[test]
    fn test_north_is_on_top() {
        let (_, detour) = example_levels().remove(3);
        let board = SolutionFormatter::format_level(&detour);
        let rows: Vec<&str> = board.lines().collect();
        assert_eq!(rows[0], "X←←←");
        assert_eq!(rows[2], "E→→↑");
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        // Should either be colored or plain text
        assert!(colored.contains("test"));

        let success = ColorOutput::success("OK");
        assert!(success.contains("OK"));
    }
}
